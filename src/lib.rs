#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod cli;
pub mod events;
pub mod game;
pub mod questions;
pub mod types;

pub use board::{AssignMode, Board, Cell, Position};
pub use events::{EventContext, EventKind};
pub use game::{GameConfig, GameError, GameEvent, GameSession, Phase, StepOutcome};
pub use questions::{BankConfig, Question, QuestionBank, QuestionSource};
pub use types::{Category, Symbol};

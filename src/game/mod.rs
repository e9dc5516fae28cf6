pub mod players;
pub mod session;
pub mod turns;

pub use players::{Player, SEAT_SYMBOLS};
pub use session::{
    GameConfig, GameError, GameEvent, GameSession, PendingQuestion, Phase, StepOutcome,
};
pub use turns::{DEFAULT_WIN_LENGTH, MatchRecord, TurnAuthority};

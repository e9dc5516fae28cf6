pub mod board_display;
pub mod log;
pub mod stats;
pub mod tui;

pub use board_display::{cell_glyph, render_board};
pub use log::describe;
pub use stats::GameStats;
pub use tui::TuiApp;

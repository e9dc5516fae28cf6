use serde::{Deserialize, Serialize};

use crate::types::Symbol;

/// Symbols handed out to seats in roster order.
pub const SEAT_SYMBOLS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub symbol: Symbol,
    pub name: String,
    /// Cells currently held, refreshed after every resolution. Display only.
    pub score: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, symbol: Symbol) -> Self {
        Self {
            symbol,
            name: name.into(),
            score: 0,
        }
    }

    /// Standard roster: `Team A`, `Team B`, ... with matching symbols.
    pub fn roster(count: usize) -> Vec<Player> {
        SEAT_SYMBOLS
            .iter()
            .take(count)
            .map(|mark| Player::new(format!("Team {mark}"), Symbol::new(*mark)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_symbols_are_distinct() {
        let roster = Player::roster(4);
        assert_eq!(roster.len(), 4);
        assert_eq!(roster[0].symbol, Symbol::new('A'));
        assert_eq!(roster[3].symbol, Symbol::new('D'));
        assert_eq!(roster[1].name, "Team B");
    }
}

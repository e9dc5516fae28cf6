use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Single-character mark a team stamps on the cells it captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(char);

impl Symbol {
    pub const fn new(mark: char) -> Self {
        Symbol(mark)
    }

    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Bonus,
    Warning,
    Challenge,
    Danger,
    Special,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Bonus,
        Category::Warning,
        Category::Challenge,
        Category::Danger,
        Category::Special,
    ];
}

/// Which seat is on the hook for the currently open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AskTeam {
    Current,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnDirection {
    Forward,
    Reverse,
}

impl TurnDirection {
    /// Seat-index step applied on every turn advance.
    pub const fn delta(self) -> isize {
        match self {
            TurnDirection::Forward => 1,
            TurnDirection::Reverse => -1,
        }
    }

    pub const fn reversed(self) -> TurnDirection {
        match self {
            TurnDirection::Forward => TurnDirection::Reverse,
            TurnDirection::Reverse => TurnDirection::Forward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    EnemyCell,
}

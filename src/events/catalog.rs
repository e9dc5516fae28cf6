use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::types::Category;

/// Every concrete event rule a cell can carry. The first sixteen are drawn
/// from category pools at activation time; the rest are only reachable via
/// explicit assignment or the chaos redraw.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    DoubleCorrect,
    ExtraTurnOrLose,
    OpponentQuestion,
    LoseTurn,
    OpponentCapture,
    RemoveOnly,
    SkipNextOpponent,
    DoubleMove,
    BlockCell,
    ChangeOwner,
    FreeCapture,
    HintUnlock,
    SwitchQuestion,
    NukeArea,
    ProtectCell,
    ShuffleEvents,
    StealQuestion,
    TeamSwap,
    SwapTurn,
    ReverseOrder,
    ChaosMode,
}

/// Intro copy shown when an event cell is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub title: &'static str,
    pub desc: &'static str,
}

impl EventKind {
    pub fn category(self) -> Category {
        match self {
            EventKind::DoubleCorrect
            | EventKind::DoubleMove
            | EventKind::FreeCapture
            | EventKind::HintUnlock
            | EventKind::ProtectCell => Category::Bonus,
            EventKind::ExtraTurnOrLose | EventKind::BlockCell => Category::Warning,
            EventKind::OpponentQuestion
            | EventKind::SwitchQuestion
            | EventKind::StealQuestion => Category::Challenge,
            EventKind::LoseTurn
            | EventKind::OpponentCapture
            | EventKind::RemoveOnly
            | EventKind::SkipNextOpponent
            | EventKind::NukeArea
            | EventKind::SwapTurn => Category::Danger,
            EventKind::ChangeOwner
            | EventKind::ShuffleEvents
            | EventKind::TeamSwap
            | EventKind::ReverseOrder
            | EventKind::ChaosMode => Category::Special,
        }
    }

    pub fn info(self) -> EventInfo {
        match self {
            EventKind::DoubleCorrect => EventInfo {
                title: "Answer 2 questions in a row to capture.",
                desc: "Any wrong answer and the cell stays empty.",
            },
            EventKind::ExtraTurnOrLose => EventInfo {
                title: "Correct: extra turn. Wrong: lose your turn.",
                desc: "Answer correctly to capture and move again. Miss and your turn is gone.",
            },
            EventKind::OpponentQuestion => EventInfo {
                title: "The opposing team answers instead.",
                desc: "If they answer correctly they capture this cell. If not, it stays empty.",
            },
            EventKind::LoseTurn => EventInfo {
                title: "Lose your turn immediately.",
                desc: "The current turn is skipped. No question.",
            },
            EventKind::OpponentCapture => EventInfo {
                title: "The opponents capture this cell.",
                desc: "The cell goes to the opposing team at once. No question.",
            },
            EventKind::RemoveOnly => EventInfo {
                title: "Remove one enemy cell.",
                desc: "Pick an enemy cell and clear it. This cell stays empty.",
            },
            EventKind::SkipNextOpponent => EventInfo {
                title: "Skip the opponents' next turn.",
                desc: "When their turn comes up it is passed over, once.",
            },
            EventKind::DoubleMove => EventInfo {
                title: "Correct answer grants a second turn.",
                desc: "Answer correctly to capture this cell and move again.",
            },
            EventKind::BlockCell => EventInfo {
                title: "The cell locks shut.",
                desc: "Nobody can ever capture this cell.",
            },
            EventKind::ChangeOwner => EventInfo {
                title: "Steal one enemy cell.",
                desc: "Answer correctly to transfer one enemy cell to your team.",
            },
            EventKind::FreeCapture => EventInfo {
                title: "Free capture.",
                desc: "No question needed. The cell is yours at once.",
            },
            EventKind::HintUnlock => EventInfo {
                title: "Hint unlocked.",
                desc: "Wrong options are crossed out and you get 5 extra seconds.",
            },
            EventKind::SwitchQuestion => EventInfo {
                title: "Swap the question once.",
                desc: "While the question is open you may redraw a different one, once.",
            },
            EventKind::NukeArea => EventInfo {
                title: "Wide-area wipe.",
                desc: "Clears every unprotected cell in the 3x3 area around this one.",
            },
            EventKind::ProtectCell => EventInfo {
                title: "The cell is shielded.",
                desc: "Removal and nukes cannot touch it.",
            },
            EventKind::ShuffleEvents => EventInfo {
                title: "Events reshuffle.",
                desc: "Event tiles on unowned cells trade places.",
            },
            EventKind::StealQuestion => EventInfo {
                title: "The opponents answer first.",
                desc: "If they miss, your team gets one shot at the same cell.",
            },
            EventKind::TeamSwap => EventInfo {
                title: "Teams trade symbols.",
                desc: "The first two teams swap marks, territory included.",
            },
            EventKind::SwapTurn => EventInfo {
                title: "The turn passes on.",
                desc: "The next team takes over right now and answers this question.",
            },
            EventKind::ReverseOrder => EventInfo {
                title: "Turn order reverses.",
                desc: "Felt from the next turn change onward.",
            },
            EventKind::ChaosMode => EventInfo {
                title: "Chaos!",
                desc: "One random effect from the chaos list applies.",
            },
        }
    }
}

impl Category {
    /// Identifier pool an activation draws from when the cell carries only a
    /// category.
    pub fn pool(self) -> &'static [EventKind] {
        match self {
            Category::Bonus => &[
                EventKind::DoubleCorrect,
                EventKind::DoubleMove,
                EventKind::FreeCapture,
                EventKind::HintUnlock,
                EventKind::ProtectCell,
            ],
            Category::Warning => &[EventKind::ExtraTurnOrLose, EventKind::BlockCell],
            Category::Danger => &[
                EventKind::LoseTurn,
                EventKind::OpponentCapture,
                EventKind::RemoveOnly,
                EventKind::SkipNextOpponent,
                EventKind::NukeArea,
            ],
            Category::Challenge => &[EventKind::OpponentQuestion, EventKind::SwitchQuestion],
            Category::Special => &[EventKind::ChangeOwner, EventKind::ShuffleEvents],
        }
    }
}

/// Sub-list the chaos meta-event redraws from.
pub const CHAOS_CHOICES: [EventKind; 5] = [
    EventKind::DoubleCorrect,
    EventKind::DoubleMove,
    EventKind::FreeCapture,
    EventKind::ExtraTurnOrLose,
    EventKind::NukeArea,
];

static POOLED: Lazy<Vec<EventKind>> = Lazy::new(|| {
    Category::ALL
        .iter()
        .flat_map(|category| category.pool().iter().copied())
        .collect()
});

/// Every identifier reachable through a category pool, in pool order. Used by
/// exhaustive board assignment.
pub fn pooled_kinds() -> Vec<EventKind> {
    POOLED.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn pools_agree_with_categories() {
        for category in Category::ALL {
            for kind in category.pool() {
                assert_eq!(kind.category(), category, "{kind} sits in the wrong pool");
            }
        }
    }

    #[test]
    fn pooled_kinds_are_distinct() {
        let pooled = pooled_kinds();
        let unique: HashSet<EventKind> = pooled.iter().copied().collect();
        assert_eq!(pooled.len(), unique.len());
        assert_eq!(pooled.len(), 16);
    }

    #[test]
    fn chaos_choices_are_pooled() {
        let pooled = pooled_kinds();
        for kind in CHAOS_CHOICES {
            assert!(pooled.contains(&kind));
        }
    }

    #[test]
    fn identifier_spelling_round_trips() {
        assert_eq!("NUKE_AREA".parse::<EventKind>(), Ok(EventKind::NukeArea));
        assert_eq!(EventKind::DoubleCorrect.to_string(), "DOUBLE_CORRECT");
        for kind in EventKind::iter() {
            assert_eq!(kind.to_string().parse::<EventKind>(), Ok(kind));
        }
    }
}

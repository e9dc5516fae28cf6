use crate::game::GameEvent;

/// Human-readable line for one engine event, shared by the TUI history panel
/// and the simulator feed.
pub fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::CellActivated { pos, symbol } => format!("{symbol} opened {pos}"),
        GameEvent::EventTriggered { pos, kind, category } => {
            format!("{category} event {kind} at {pos}")
        }
        GameEvent::ChaosResolved { kind } => format!("Chaos wheel landed on {kind}"),
        GameEvent::QuestionOpened { symbol } => format!("Question goes to {symbol}"),
        GameEvent::QuestionRerolled { symbol } => format!("{symbol} switched the question"),
        GameEvent::QuestionPoolExhausted => "The question pool is empty".to_string(),
        GameEvent::AnswerResolved { symbol, was_correct: true } => {
            format!("{symbol} answered correctly")
        }
        GameEvent::AnswerResolved { symbol, was_correct: false } => {
            format!("{symbol} answered wrong")
        }
        GameEvent::CellCaptured { pos, symbol } => format!("{symbol} captured {pos}"),
        GameEvent::CellRemoved { pos, prev_owner: Some(prev) } => {
            format!("{pos} wiped clean, {prev} loses it")
        }
        GameEvent::CellRemoved { pos, prev_owner: None } => format!("{pos} wiped clean"),
        GameEvent::CellBlocked { pos } => format!("{pos} is blocked for the rest of the game"),
        GameEvent::CellProtected { pos } => format!("{pos} is now protected"),
        GameEvent::AreaNuked { center, cleared } => {
            format!("Nuke around {center} cleared {cleared} cells")
        }
        GameEvent::EventsShuffled { cells } => {
            format!("Events reshuffled across {cells} cells")
        }
        GameEvent::OwnerStolen { pos, from: Some(prev), to } => {
            format!("{to} stole {pos} from {prev}")
        }
        GameEvent::OwnerStolen { pos, from: None, to } => format!("{to} took over {pos}"),
        GameEvent::SkipArmed { symbol } => format!("{symbol} will sit out their next turn"),
        GameEvent::TurnLost { symbol } => format!("{symbol} loses the turn"),
        GameEvent::TurnPassed { symbol } => format!("Turn passes to {symbol}"),
        GameEvent::OrderReversed { direction } => {
            format!("Turn order now runs {direction}")
        }
        GameEvent::SymbolsSwapped { first, second } => {
            format!("{first} and {second} traded symbols")
        }
        GameEvent::ReboundOffered { symbol } => {
            format!("Rebound, {symbol} may answer the same question")
        }
        GameEvent::TargetRequired { count: 1 } => "Pick an enemy cell".to_string(),
        GameEvent::TargetRequired { count } => format!("Pick {count} enemy cells"),
        GameEvent::TargetChosen { pos } => format!("Target {pos} picked"),
        GameEvent::SelectionCancelled => "Selection cleared".to_string(),
        GameEvent::TurnAdvanced { symbol } => format!("{symbol} is up"),
        GameEvent::ExtraTurn { symbol } => format!("{symbol} goes again"),
        GameEvent::GameWon { symbol } => format!("{symbol} wins the match"),
        GameEvent::BoardFull { winner: Some(symbol) } => {
            format!("Board full, {symbol} takes it on cells")
        }
        GameEvent::BoardFull { winner: None } => "Board full, dead even".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use crate::types::Symbol;

    #[test]
    fn lines_name_the_actors() {
        let captured = GameEvent::CellCaptured {
            pos: Position::new(2, 3),
            symbol: Symbol::new('A'),
        };
        assert_eq!(describe(&captured), "A captured (2, 3)");

        let stolen = GameEvent::OwnerStolen {
            pos: Position::new(0, 0),
            from: Some(Symbol::new('B')),
            to: Symbol::new('A'),
        };
        assert_eq!(describe(&stolen), "A stole (0, 0) from B");
    }

    #[test]
    fn target_count_switches_phrasing() {
        assert_eq!(describe(&GameEvent::TargetRequired { count: 1 }), "Pick an enemy cell");
        assert_eq!(describe(&GameEvent::TargetRequired { count: 3 }), "Pick 3 enemy cells");
    }
}

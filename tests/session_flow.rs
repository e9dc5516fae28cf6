//! End-to-end activation flows driven through the public session API.

use quizcaro::board::Position;
use quizcaro::events::EventKind;
use quizcaro::game::{GameConfig, GameError, GameEvent, GameSession, Phase};
use quizcaro::questions::{Question, QuestionSource};
use quizcaro::types::Symbol;

/// Deterministic source handing out numbered four-option questions forever.
struct ScriptedSource {
    dealt: u32,
}

impl ScriptedSource {
    fn new() -> Self {
        Self { dealt: 0 }
    }
}

impl QuestionSource for ScriptedSource {
    fn next_question(&mut self) -> Option<Question> {
        self.dealt += 1;
        Some(Question {
            id: self.dealt,
            prompt: format!("Question {}", self.dealt),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 0,
        })
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Source that runs dry after a fixed number of draws.
struct DryingSource {
    left: u32,
    dealt: u32,
}

impl QuestionSource for DryingSource {
    fn next_question(&mut self) -> Option<Question> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        self.dealt += 1;
        Some(Question {
            id: self.dealt,
            prompt: "last call".to_string(),
            options: vec!["a".into(), "b".into()],
            correct_index: 0,
        })
    }

    fn is_exhausted(&self) -> bool {
        self.left == 0
    }
}

fn plain_session(board_size: usize, win_length: usize) -> GameSession {
    let config = GameConfig {
        num_players: 2,
        board_size,
        win_length,
        event_cells: 0,
        exhaustive_events: false,
        seed: 11,
    };
    GameSession::new(config, Box::new(ScriptedSource::new()))
}

/// 6x6 board with every pooled event laid out, so tests can activate a
/// specific kind without fishing through random draws.
fn exhaustive_session(seed: u64) -> GameSession {
    let config = GameConfig {
        num_players: 2,
        board_size: 6,
        win_length: 5,
        event_cells: 0,
        exhaustive_events: true,
        seed,
    };
    GameSession::new(config, Box::new(ScriptedSource::new()))
}

fn find_event_cell(session: &GameSession, kind: EventKind) -> Position {
    session
        .board()
        .positions()
        .find(|pos| {
            session
                .board()
                .cell(*pos)
                .is_some_and(|cell| cell.event == Some(kind))
        })
        .expect("exhaustive board carries every pooled kind")
}

fn find_plain_cell(session: &GameSession) -> Position {
    session
        .board()
        .positions()
        .find(|pos| {
            session
                .board()
                .cell(*pos)
                .is_some_and(|cell| cell.is_free() && !cell.has_event())
        })
        .expect("free plain cell")
}

#[test]
fn straight_run_wins_on_a_small_board() {
    let mut session = plain_session(3, 3);
    let a = Symbol::new('A');

    // A claims the top row across three turns; B burns the turns in between
    // with misses elsewhere.
    for step in 0..3usize {
        session.activate(Position::new(0, step)).unwrap();
        let outcome = session.submit_answer(true).unwrap();

        if step < 2 {
            assert!(!outcome.done);
            session.activate(Position::new(2, step)).unwrap();
            session.submit_answer(false).unwrap();
        } else {
            assert!(outcome.done);
            assert_eq!(outcome.winner, Some(a));
        }
    }

    assert_eq!(session.phase(), Phase::Finished { winner: Some(a) });
    assert!(
        session
            .history()
            .iter()
            .any(|event| matches!(event, GameEvent::GameWon { symbol } if *symbol == a))
    );
}

#[test]
fn nuke_event_resolves_without_a_question() {
    let mut session = exhaustive_session(3);
    let nuke = find_event_cell(&session, EventKind::NukeArea);

    session.activate(nuke).unwrap();
    assert_eq!(session.phase(), Phase::EventIntro);

    let outcome = session.confirm().unwrap();
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::AreaNuked { center, .. } if *center == nuke))
    );
    assert_eq!(session.phase(), Phase::AwaitingActivation);
    assert_eq!(session.turns().current_symbol(), Symbol::new('B'));
}

#[test]
fn steal_flow_takes_target_and_trigger() {
    let mut session = exhaustive_session(5);
    let steal = find_event_cell(&session, EventKind::ChangeOwner);
    let a = Symbol::new('A');
    let b = Symbol::new('B');

    // Each side banks one plain cell so the steal has a target.
    let first = find_plain_cell(&session);
    session.activate(first).unwrap();
    session.submit_answer(true).unwrap();
    let second = find_plain_cell(&session);
    session.activate(second).unwrap();
    session.submit_answer(true).unwrap();
    assert_eq!(session.board().owner(first), Some(a));
    assert_eq!(session.board().owner(second), Some(b));

    // A runs the steal: intro, target, confirmation, then the question.
    session.activate(steal).unwrap();
    session.confirm().unwrap();
    assert_eq!(session.phase(), Phase::TargetSelection);
    assert_eq!(session.candidates(), &[second]);
    session.select_target(second).unwrap();
    assert_eq!(session.phase(), Phase::ConfirmTarget);
    session.confirm().unwrap();
    assert_eq!(session.phase(), Phase::QuestionOpen);
    let outcome = session.submit_answer(true).unwrap();

    assert_eq!(session.board().owner(second), Some(a));
    assert_eq!(session.board().owner(steal), Some(a));
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::OwnerStolen { .. }))
    );
    assert_eq!(session.turns().current_symbol(), b);
}

#[test]
fn reroll_allowance_is_single_use() {
    let mut session = exhaustive_session(7);
    let switch = find_event_cell(&session, EventKind::SwitchQuestion);

    session.activate(switch).unwrap();
    session.confirm().unwrap();
    assert_eq!(session.phase(), Phase::QuestionOpen);
    let before = session.pending_question().unwrap().question.id;
    assert!(session.pending_question().unwrap().can_reroll);

    let outcome = session.cancel().unwrap();
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::QuestionRerolled { .. }))
    );
    let after = session.pending_question().unwrap().question.id;
    assert_ne!(before, after);
    assert!(!session.pending_question().unwrap().can_reroll);
    assert!(session.cancel().is_err());
}

#[test]
fn blocked_trigger_rejects_reactivation() {
    let mut session = exhaustive_session(13);
    let block = find_event_cell(&session, EventKind::BlockCell);

    session.activate(block).unwrap();
    let outcome = session.confirm().unwrap();
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::CellBlocked { pos } if *pos == block))
    );

    // Marker effects leave the activating seat on the move.
    assert_eq!(session.turns().current_symbol(), Symbol::new('A'));
    assert_eq!(session.phase(), Phase::AwaitingActivation);
    assert!(matches!(
        session.activate(block),
        Err(GameError::CellBlocked(_))
    ));
}

#[test]
fn opponent_capture_hands_cell_to_the_other_team() {
    let mut session = exhaustive_session(21);
    let gift = find_event_cell(&session, EventKind::OpponentCapture);
    let b = Symbol::new('B');

    session.activate(gift).unwrap();
    let outcome = session.confirm().unwrap();

    assert_eq!(session.board().owner(gift), Some(b));
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::CellCaptured { symbol, .. } if *symbol == b))
    );
    assert_eq!(session.turns().current_symbol(), b);
}

#[test]
fn pass_then_quiz_hands_question_to_next_seat() {
    let mut session = exhaustive_session(17);
    let swap = find_event_cell(&session, EventKind::SwapTurn);
    let b = Symbol::new('B');

    session.activate(swap).unwrap();
    let outcome = session.confirm().unwrap();
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::TurnPassed { .. }))
    );
    assert_eq!(session.phase(), Phase::QuestionOpen);
    assert_eq!(session.pending_question().unwrap().symbol, b);

    session.submit_answer(true).unwrap();
    assert_eq!(session.board().owner(swap), Some(b));
    // B answered as the acting seat; play moves on to A.
    assert_eq!(session.turns().current_symbol(), Symbol::new('A'));
}

#[test]
fn skip_armed_by_event_fires_once() {
    let mut session = exhaustive_session(29);
    let skip = find_event_cell(&session, EventKind::SkipNextOpponent);
    let a = Symbol::new('A');
    let b = Symbol::new('B');

    session.activate(skip).unwrap();
    let outcome = session.confirm().unwrap();
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::SkipArmed { symbol } if *symbol == b))
    );
    // Marker: A is still on the move, the skip waits for B's seat.
    assert_eq!(session.turns().current_symbol(), a);
    assert_eq!(session.turns().pending_skip(), Some(b));

    // A finishes a normal turn; the advance jumps straight past B.
    let plain = find_plain_cell(&session);
    session.activate(plain).unwrap();
    session.submit_answer(true).unwrap();
    assert_eq!(session.turns().current_symbol(), a);
    assert_eq!(session.turns().pending_skip(), None);
}

#[test]
fn full_board_without_run_ends_in_majority() {
    let mut session = plain_session(2, 3);
    let a = Symbol::new('A');
    let cells = [(0, 0), (0, 1), (1, 0), (1, 1)];

    let mut last = None;
    for (idx, (row, col)) in cells.iter().enumerate() {
        session.activate(Position::new(*row, *col)).unwrap();
        last = Some(session.submit_answer(true).unwrap());

        if idx < 3 {
            // B wastes the interleaved turn on a miss at the next free cell.
            let (brow, bcol) = cells[idx + 1];
            session.activate(Position::new(brow, bcol)).unwrap();
            session.submit_answer(false).unwrap();
        }
    }

    let outcome = last.unwrap();
    assert!(outcome.done);
    assert_eq!(outcome.winner, Some(a));
    assert!(session.history().iter().any(
        |event| matches!(event, GameEvent::BoardFull { winner: Some(symbol) } if *symbol == a)
    ));
}

#[test]
fn exhausted_bank_aborts_activation() {
    let config = GameConfig {
        num_players: 2,
        board_size: 3,
        win_length: 3,
        event_cells: 0,
        exhaustive_events: false,
        seed: 5,
    };
    let mut session = GameSession::new(config, Box::new(DryingSource { left: 1, dealt: 0 }));
    let b = Symbol::new('B');

    session.activate(Position::new(0, 0)).unwrap();
    session.submit_answer(true).unwrap();
    assert_eq!(session.turns().current_symbol(), b);

    // Bank is dry: the activation aborts before any state changes.
    let outcome = session.activate(Position::new(1, 1)).unwrap();
    assert!(
        outcome
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::QuestionPoolExhausted))
    );
    assert_eq!(session.phase(), Phase::AwaitingActivation);
    assert_eq!(session.turns().current_symbol(), b);
    assert!(!session.finished());
}

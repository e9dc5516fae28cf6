use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{AssignMode, Board, Position};
use crate::events::catalog::EventKind;
use crate::events::resolver::{self, EventContext};
use crate::game::players::{Player, SEAT_SYMBOLS};
use crate::game::turns::{DEFAULT_WIN_LENGTH, TurnAuthority};
use crate::questions::{Question, QuestionSource};
use crate::types::{AskTeam, Category, Symbol, TurnDirection};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub num_players: usize,
    pub board_size: usize,
    pub win_length: usize,
    /// Cells that get an event category under random assignment.
    pub event_cells: usize,
    /// Lay every pooled identifier on its own cell instead of scattering
    /// random categories.
    pub exhaustive_events: bool,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 2,
            board_size: 10,
            win_length: DEFAULT_WIN_LENGTH,
            event_cells: 20,
            exhaustive_events: false,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingActivation,
    EventIntro,
    TargetSelection,
    ConfirmTarget,
    QuestionOpen,
    Finished { winner: Option<Symbol> },
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub events: Vec<GameEvent>,
    pub winner: Option<Symbol>,
    pub done: bool,
}

impl StepOutcome {
    fn empty() -> Self {
        Self {
            events: Vec::new(),
            winner: None,
            done: false,
        }
    }
}

/// Everything the engine reports outward, one entry per observable change.
/// The session keeps the full stream in `history` for the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    CellActivated { pos: Position, symbol: Symbol },
    EventTriggered { pos: Position, kind: EventKind, category: Category },
    ChaosResolved { kind: EventKind },
    QuestionOpened { symbol: Symbol },
    QuestionRerolled { symbol: Symbol },
    QuestionPoolExhausted,
    AnswerResolved { symbol: Symbol, was_correct: bool },
    CellCaptured { pos: Position, symbol: Symbol },
    CellRemoved { pos: Position, prev_owner: Option<Symbol> },
    CellBlocked { pos: Position },
    CellProtected { pos: Position },
    AreaNuked { center: Position, cleared: usize },
    EventsShuffled { cells: usize },
    OwnerStolen { pos: Position, from: Option<Symbol>, to: Symbol },
    SkipArmed { symbol: Symbol },
    TurnLost { symbol: Symbol },
    TurnPassed { symbol: Symbol },
    OrderReversed { direction: TurnDirection },
    SymbolsSwapped { first: Symbol, second: Symbol },
    ReboundOffered { symbol: Symbol },
    TargetRequired { count: usize },
    TargetChosen { pos: Position },
    SelectionCancelled,
    TurnAdvanced { symbol: Symbol },
    ExtraTurn { symbol: Symbol },
    GameWon { symbol: Symbol },
    BoardFull { winner: Option<Symbol> },
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game already completed")]
    GameFinished,
    #[error("an activation is already in progress")]
    ActivationInProgress,
    #[error("position {0} is outside the board")]
    OutOfBounds(Position),
    #[error("cell {0} is already owned")]
    CellOwned(Position),
    #[error("cell {0} is blocked")]
    CellBlocked(Position),
    #[error("cell {0} is not a selectable target")]
    IllegalTarget(Position),
    #[error("no question is open")]
    NoQuestionPending,
    #[error("no target selection is in progress")]
    NoSelectionPending,
    #[error("nothing to confirm in the current phase")]
    NothingToConfirm,
    #[error("nothing to cancel in the current phase")]
    NothingToCancel,
}

/// Open question as the presentation sees it: who answers, which options are
/// struck out by a hint, how much bonus time the event granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub question: Question,
    pub ask: AskTeam,
    pub symbol: Symbol,
    pub extra_seconds: u16,
    pub disabled_options: Vec<usize>,
    pub can_reroll: bool,
}

#[derive(Debug, Clone)]
struct Activation {
    pos: Position,
    /// `None` for plain cells, which go straight to a question.
    ctx: Option<EventContext>,
}

/// The activation entry point. Front-ends drive the whole game through four
/// primitives: `activate`, `submit_answer`, `select_target` and
/// `confirm`/`cancel`; everything else is read-only inspection.
pub struct GameSession {
    pub id: Uuid,
    pub config: GameConfig,
    board: Board,
    turns: TurnAuthority,
    source: Box<dyn QuestionSource>,
    rng: StdRng,
    phase: Phase,
    active: Option<Activation>,
    pending: Option<PendingQuestion>,
    candidates: Vec<Position>,
    history: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(config: GameConfig, source: Box<dyn QuestionSource>) -> Self {
        assert!(
            (2..=SEAT_SYMBOLS.len()).contains(&config.num_players),
            "rosters run from 2 to {} seats",
            SEAT_SYMBOLS.len()
        );
        assert!(config.board_size > 0, "the board needs at least one cell");

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut board = Board::new(config.board_size);
        let mode = if config.exhaustive_events {
            AssignMode::Exhaustive
        } else {
            AssignMode::Random {
                event_cells: config.event_cells,
            }
        };
        board.assign_events(mode, &mut rng);
        let turns = TurnAuthority::new(Player::roster(config.num_players), config.win_length);

        Self {
            id: Uuid::new_v4(),
            config,
            board,
            turns,
            source,
            rng,
            phase: Phase::AwaitingActivation,
            active: None,
            pending: None,
            candidates: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turns(&self) -> &TurnAuthority {
        &self.turns
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn winner(&self) -> Option<Symbol> {
        match self.phase {
            Phase::Finished { winner } => winner,
            _ => None,
        }
    }

    pub fn pending_question(&self) -> Option<&PendingQuestion> {
        self.pending.as_ref()
    }

    /// Selectable positions while a target selection is in progress.
    pub fn candidates(&self) -> &[Position] {
        &self.candidates
    }

    pub fn history(&self) -> &[GameEvent] {
        &self.history
    }

    pub fn active_cell(&self) -> Option<Position> {
        self.active.as_ref().map(|active| active.pos)
    }

    /// Context of the activation in flight, for intro and status rendering.
    pub fn active_event(&self) -> Option<&EventContext> {
        self.active.as_ref().and_then(|active| active.ctx.as_ref())
    }

    /// Activates a free cell for the current seat. Event cells surface their
    /// intro and wait for `confirm`; plain cells open a question right away.
    pub fn activate(&mut self, pos: Position) -> Result<StepOutcome, GameError> {
        self.ensure_running()?;
        if self.phase != Phase::AwaitingActivation {
            return Err(GameError::ActivationInProgress);
        }
        let cell = self.board.cell(pos).ok_or(GameError::OutOfBounds(pos))?;
        if cell.blocked {
            return Err(GameError::CellBlocked(pos));
        }
        if cell.is_owned() {
            return Err(GameError::CellOwned(pos));
        }
        let category = cell.category;
        let preset = cell.event;

        let seat_before = self.turns.current_index();
        let mut outcome = StepOutcome::empty();

        // A dry source cannot open the question this activation will need, so
        // the activation aborts with the board and seat untouched.
        if self.source.is_exhausted() {
            outcome.events.push(GameEvent::QuestionPoolExhausted);
            self.finish_step(&mut outcome, seat_before);
            return Ok(outcome);
        }

        outcome.events.push(GameEvent::CellActivated {
            pos,
            symbol: self.turns.current_symbol(),
        });

        match category {
            None => {
                self.active = Some(Activation { pos, ctx: None });
                self.open_question(&mut outcome)?;
            }
            Some(category) => {
                let kind = match preset {
                    Some(kind) => kind,
                    None => *category
                        .pool()
                        .choose(&mut self.rng)
                        .unwrap_or(&EventKind::DoubleCorrect),
                };
                // Pin the draw so re-activating an unresolved cell replays
                // the same rule.
                self.board.record_drawn_event(pos, kind);
                let ctx = resolver::plan(kind, category, &mut self.rng);
                outcome.events.push(GameEvent::EventTriggered {
                    pos,
                    kind,
                    category,
                });
                if ctx.kind != kind {
                    outcome.events.push(GameEvent::ChaosResolved { kind: ctx.kind });
                }
                self.active = Some(Activation {
                    pos,
                    ctx: Some(ctx),
                });
                self.phase = Phase::EventIntro;
            }
        }
        self.finish_step(&mut outcome, seat_before);
        Ok(outcome)
    }

    /// Feeds the final verdict on the open question into the resolver, then
    /// closes the round through the turn authority.
    pub fn submit_answer(&mut self, was_correct: bool) -> Result<StepOutcome, GameError> {
        self.ensure_running()?;
        if self.phase != Phase::QuestionOpen {
            return Err(GameError::NoQuestionPending);
        }
        let pending = self.pending.take().ok_or(GameError::NoQuestionPending)?;
        let seat_before = self.turns.current_index();
        let mut outcome = StepOutcome::empty();
        outcome.events.push(GameEvent::AnswerResolved {
            symbol: pending.symbol,
            was_correct,
        });

        let Some(active) = self.active.as_mut() else {
            return Err(GameError::NoQuestionPending);
        };
        let pos = active.pos;

        let mut ask_more = false;
        let mut capture_symbol = None;
        let mut advance = true;
        let mut extra_turn = false;
        let mut report_lost_turn = false;

        if let Some(ctx) = active.ctx.as_mut() {
            let answering = ctx.answering_symbol(&self.turns);
            let policy = ctx.quiz_policy();
            let resolved =
                resolver::resolve_answer(ctx, &mut self.turns, &mut self.board, pos, was_correct);
            outcome.events.extend(resolved.events);
            ask_more = resolved.ask_more;
            extra_turn = resolved.extra_turn;
            advance = !resolved.extra_turn;
            if resolved.captured && !resolved.resolution_complete {
                capture_symbol = Some(answering);
            }
            report_lost_turn = !was_correct && !ask_more && policy.lose_turn;
        }

        if ask_more {
            self.open_question(&mut outcome)?;
            self.finish_step(&mut outcome, seat_before);
            return Ok(outcome);
        }

        if report_lost_turn {
            outcome.events.push(GameEvent::TurnLost {
                symbol: pending.symbol,
            });
        }

        let owner_before = self.board.owner(pos);
        let winner =
            self.turns
                .resolve_answer(&mut self.board, pos, was_correct, capture_symbol, advance);
        // Captures made by the resolver were already reported; this catches
        // the generic claim of the activated cell itself.
        if self.board.owner(pos) != owner_before {
            if let Some(symbol) = self.board.owner(pos) {
                outcome.events.push(GameEvent::CellCaptured { pos, symbol });
            }
        }
        if let Some(symbol) = winner {
            self.finish_with_winner(symbol, &mut outcome);
            self.finish_step(&mut outcome, seat_before);
            return Ok(outcome);
        }

        if extra_turn {
            outcome.events.push(GameEvent::ExtraTurn {
                symbol: self.turns.current_symbol(),
            });
        }
        self.clear_activation();
        self.phase = Phase::AwaitingActivation;
        self.check_board_full(&mut outcome);
        self.finish_step(&mut outcome, seat_before);
        Ok(outcome)
    }

    /// Picks one of the surfaced candidates for the pending target request.
    pub fn select_target(&mut self, pos: Position) -> Result<StepOutcome, GameError> {
        self.ensure_running()?;
        if self.phase != Phase::TargetSelection {
            return Err(GameError::NoSelectionPending);
        }
        if !self.candidates.contains(&pos) {
            return Err(GameError::IllegalTarget(pos));
        }
        let seat_before = self.turns.current_index();
        let Some(request) = self
            .active
            .as_mut()
            .and_then(|active| active.ctx.as_mut())
            .and_then(EventContext::target_request_mut)
        else {
            return Err(GameError::NoSelectionPending);
        };
        if request.selected.contains(&pos) {
            return Err(GameError::IllegalTarget(pos));
        }
        request.selected.push(pos);
        let satisfied = request.is_satisfied();

        let mut outcome = StepOutcome::empty();
        outcome.events.push(GameEvent::TargetChosen { pos });
        if satisfied {
            self.phase = Phase::ConfirmTarget;
        }
        self.finish_step(&mut outcome, seat_before);
        Ok(outcome)
    }

    /// Advances out of the intro or applies a completed target selection.
    pub fn confirm(&mut self) -> Result<StepOutcome, GameError> {
        self.ensure_running()?;
        let seat_before = self.turns.current_index();
        let mut outcome = StepOutcome::empty();
        match self.phase {
            Phase::EventIntro => {
                let needs_target = self
                    .active
                    .as_ref()
                    .and_then(|active| active.ctx.as_ref())
                    .is_some_and(EventContext::requires_target);
                if needs_target {
                    let candidates = self.enemy_candidates();
                    if candidates.is_empty() {
                        // Nothing to aim at: removal fizzles, a steal plays
                        // out as a plain question.
                        self.apply_active_immediate(&mut outcome)?;
                    } else {
                        let count = self
                            .active
                            .as_ref()
                            .and_then(|active| active.ctx.as_ref())
                            .and_then(EventContext::target_request)
                            .map_or(1, |request| request.count);
                        self.candidates = candidates;
                        outcome.events.push(GameEvent::TargetRequired { count });
                        self.phase = Phase::TargetSelection;
                    }
                } else {
                    self.apply_active_immediate(&mut outcome)?;
                }
            }
            Phase::ConfirmTarget => {
                self.apply_active_immediate(&mut outcome)?;
            }
            _ => return Err(GameError::NothingToConfirm),
        }
        self.finish_step(&mut outcome, seat_before);
        Ok(outcome)
    }

    /// During target selection: clears the picks and returns to the candidate
    /// list. During an open question: requests the one-time question switch
    /// if the event granted it.
    pub fn cancel(&mut self) -> Result<StepOutcome, GameError> {
        self.ensure_running()?;
        let seat_before = self.turns.current_index();
        let mut outcome = StepOutcome::empty();
        match self.phase {
            Phase::TargetSelection | Phase::ConfirmTarget => {
                if let Some(request) = self
                    .active
                    .as_mut()
                    .and_then(|active| active.ctx.as_mut())
                    .and_then(EventContext::target_request_mut)
                {
                    request.selected.clear();
                }
                outcome.events.push(GameEvent::SelectionCancelled);
                self.phase = Phase::TargetSelection;
            }
            Phase::QuestionOpen => self.reroll_question(&mut outcome)?,
            _ => return Err(GameError::NothingToCancel),
        }
        self.finish_step(&mut outcome, seat_before);
        Ok(outcome)
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        if matches!(self.phase, Phase::Finished { .. }) {
            return Err(GameError::GameFinished);
        }
        Ok(())
    }

    fn apply_active_immediate(&mut self, outcome: &mut StepOutcome) -> Result<(), GameError> {
        self.candidates.clear();
        let Some(active) = self.active.as_mut() else {
            return Err(GameError::NothingToConfirm);
        };
        let pos = active.pos;
        let Some(ctx) = active.ctx.as_mut() else {
            return Err(GameError::NothingToConfirm);
        };
        let applied =
            resolver::apply_immediate(ctx, &mut self.turns, &mut self.board, pos, &mut self.rng);
        outcome.events.extend(applied.events);

        if let Some(symbol) = applied.winner {
            self.finish_with_winner(symbol, outcome);
            return Ok(());
        }
        if applied.open_question {
            self.open_question(outcome)?;
            return Ok(());
        }
        self.clear_activation();
        self.phase = Phase::AwaitingActivation;
        self.check_board_full(outcome);
        Ok(())
    }

    fn open_question(&mut self, outcome: &mut StepOutcome) -> Result<(), GameError> {
        if self.active.is_none() {
            return Err(GameError::NoQuestionPending);
        }
        let Some(question) = self.source.next_question() else {
            // Ran dry mid-flow; the activation ends where it stands.
            outcome.events.push(GameEvent::QuestionPoolExhausted);
            self.clear_activation();
            self.phase = Phase::AwaitingActivation;
            return Ok(());
        };
        let pending = self.build_pending(question);
        outcome.events.push(GameEvent::QuestionOpened {
            symbol: pending.symbol,
        });
        self.pending = Some(pending);
        self.phase = Phase::QuestionOpen;
        Ok(())
    }

    fn reroll_question(&mut self, outcome: &mut StepOutcome) -> Result<(), GameError> {
        let can_reroll = self
            .active
            .as_ref()
            .and_then(|active| active.ctx.as_ref())
            .is_some_and(EventContext::can_reroll);
        if !can_reroll {
            return Err(GameError::NothingToCancel);
        }
        // Spares first; the switch is free if nothing can be drawn at all.
        let Some(question) = self
            .source
            .next_spare()
            .or_else(|| self.source.next_question())
        else {
            outcome.events.push(GameEvent::QuestionPoolExhausted);
            return Ok(());
        };
        if let Some(ctx) = self.active.as_mut().and_then(|active| active.ctx.as_mut()) {
            ctx.consume_reroll();
        }
        let pending = self.build_pending(question);
        outcome.events.push(GameEvent::QuestionRerolled {
            symbol: pending.symbol,
        });
        self.pending = Some(pending);
        Ok(())
    }

    fn build_pending(&mut self, question: Question) -> PendingQuestion {
        match self.active.as_ref().and_then(|active| active.ctx.as_ref()) {
            Some(ctx) => {
                let disabled = if ctx.hint {
                    hint_disables(&question, &mut self.rng)
                } else {
                    Vec::new()
                };
                PendingQuestion {
                    ask: ctx.ask,
                    symbol: ctx.answering_symbol(&self.turns),
                    extra_seconds: ctx.time_bonus,
                    disabled_options: disabled,
                    can_reroll: ctx.can_reroll(),
                    question,
                }
            }
            None => PendingQuestion {
                ask: AskTeam::Current,
                symbol: self.turns.current_symbol(),
                extra_seconds: 0,
                disabled_options: Vec::new(),
                can_reroll: false,
                question,
            },
        }
    }

    fn enemy_candidates(&self) -> Vec<Position> {
        let current = self.turns.current_symbol();
        self.board
            .positions()
            .filter(|pos| {
                self.board.cell(*pos).is_some_and(|cell| {
                    !cell.protected && cell.owner.is_some_and(|owner| owner != current)
                })
            })
            .collect()
    }

    fn finish_with_winner(&mut self, symbol: Symbol, outcome: &mut StepOutcome) {
        outcome.events.push(GameEvent::GameWon { symbol });
        self.clear_activation();
        self.phase = Phase::Finished {
            winner: Some(symbol),
        };
    }

    fn check_board_full(&mut self, outcome: &mut StepOutcome) {
        if !matches!(self.phase, Phase::Finished { .. }) && self.turns.is_board_full(&self.board) {
            let winner = self.turns.majority_winner(&self.board);
            outcome.events.push(GameEvent::BoardFull { winner });
            self.phase = Phase::Finished { winner };
        }
    }

    fn clear_activation(&mut self) {
        self.active = None;
        self.pending = None;
        self.candidates.clear();
    }

    /// Refreshes display scores, stamps the turn handover, and folds the
    /// step's events into the retained history.
    fn finish_step(&mut self, outcome: &mut StepOutcome, seat_before: usize) {
        self.refresh_scores();
        if let Phase::Finished { winner } = self.phase {
            outcome.done = true;
            outcome.winner = winner;
        } else if self.turns.current_index() != seat_before {
            outcome.events.push(GameEvent::TurnAdvanced {
                symbol: self.turns.current_symbol(),
            });
        }
        self.history.extend(outcome.events.iter().cloned());
    }

    fn refresh_scores(&mut self) {
        let counts = self.turns.owner_counts(&self.board);
        let symbols: Vec<Symbol> = self.turns.players().iter().map(|p| p.symbol).collect();
        for symbol in symbols {
            let score = counts.get(&symbol).copied().unwrap_or(0) as u32;
            self.turns.set_score(symbol, score);
        }
    }
}

/// Option indices a hint strikes out: two wrong ones, or a single wrong one
/// on questions with three options or fewer.
fn hint_disables(question: &Question, rng: &mut impl rand::Rng) -> Vec<usize> {
    let mut wrong: Vec<usize> = (0..question.options.len())
        .filter(|index| *index != question.correct_index)
        .collect();
    wrong.shuffle(rng);
    let keep = if question.options.len() <= 3 { 1 } else { 2 };
    wrong.truncate(keep);
    wrong.sort_unstable();
    wrong
}

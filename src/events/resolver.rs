use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::events::catalog::{CHAOS_CHOICES, EventKind};
use crate::game::session::GameEvent;
use crate::game::turns::TurnAuthority;
use crate::types::{AskTeam, Category, Symbol, TargetKind};

/// What a correct or incorrect answer does once the question chain closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPolicy {
    pub capture: bool,
    pub extra_turn: bool,
    pub lose_turn: bool,
    /// First miss by the opposing team hands the cell back for one round.
    pub opponent_rebound: bool,
}

impl Default for QuizPolicy {
    fn default() -> Self {
        Self {
            capture: true,
            extra_turn: false,
            lose_turn: false,
            opponent_rebound: false,
        }
    }
}

/// Effects applied during the immediate pass, one variant per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImmediateEffect {
    FreeCapture,
    OpponentCapture,
    SkipTurn,
    BlockCell,
    NukeArea,
    ProtectCell,
    ShuffleEvents,
    SkipNextOpponent,
    ReverseOrder,
    SwapSymbols,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    pub kind: TargetKind,
    pub count: usize,
    pub selected: Vec<Position>,
}

impl TargetRequest {
    fn one_enemy_cell() -> Self {
        Self {
            kind: TargetKind::EnemyCell,
            count: 1,
            selected: Vec::new(),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.selected.len() >= self.count
    }
}

/// How an activation resolves. Only the variants that need them carry quiz
/// policies or target-selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPlan {
    /// Question rounds with no preceding world change.
    Quiz(QuizPolicy),
    /// The seat passes first, then the question opens for the new seat.
    PassThenQuiz(QuizPolicy),
    /// Resolves without any question.
    Immediate(ImmediateEffect),
    /// Clears a player-chosen enemy cell, no question.
    RemoveTarget(TargetRequest),
    /// Player picks an enemy cell, then a correct answer steals it.
    StealTarget(TargetRequest),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerollState {
    pub allowed: bool,
    pub used: bool,
}

/// Live state for one activation of an event cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub kind: EventKind,
    pub category: Category,
    pub ask: AskTeam,
    pub remaining: u8,
    pub time_bonus: u16,
    pub reroll: RerollState,
    pub hint: bool,
    pub rebound_used: bool,
    pub effect: EffectPlan,
}

impl EventContext {
    fn new(kind: EventKind, category: Category) -> Self {
        Self {
            kind,
            category,
            ask: AskTeam::Current,
            remaining: 1,
            time_bonus: 0,
            reroll: RerollState::default(),
            hint: false,
            rebound_used: false,
            effect: EffectPlan::Quiz(QuizPolicy::default()),
        }
    }

    /// Single default-capture question round; what unrecognized identifiers
    /// degrade to.
    pub fn fallback(category: Category) -> Self {
        Self::new(EventKind::DoubleCorrect, category)
    }

    pub fn requires_target(&self) -> bool {
        matches!(
            self.effect,
            EffectPlan::RemoveTarget(_) | EffectPlan::StealTarget(_)
        )
    }

    pub fn target_request(&self) -> Option<&TargetRequest> {
        match &self.effect {
            EffectPlan::RemoveTarget(request) | EffectPlan::StealTarget(request) => Some(request),
            _ => None,
        }
    }

    pub fn target_request_mut(&mut self) -> Option<&mut TargetRequest> {
        match &mut self.effect {
            EffectPlan::RemoveTarget(request) | EffectPlan::StealTarget(request) => Some(request),
            _ => None,
        }
    }

    pub fn can_reroll(&self) -> bool {
        self.reroll.allowed && !self.reroll.used
    }

    pub fn consume_reroll(&mut self) {
        self.reroll.used = true;
    }

    pub fn quiz_policy(&self) -> QuizPolicy {
        match &self.effect {
            EffectPlan::Quiz(policy) | EffectPlan::PassThenQuiz(policy) => *policy,
            EffectPlan::StealTarget(_) => QuizPolicy {
                capture: false,
                ..QuizPolicy::default()
            },
            EffectPlan::RemoveTarget(_) | EffectPlan::Immediate(_) => QuizPolicy::default(),
        }
    }

    /// Seat whose answer the open question round is waiting on.
    pub fn answering_symbol(&self, turns: &TurnAuthority) -> Symbol {
        match self.ask {
            AskTeam::Current => turns.current_symbol(),
            AskTeam::Opponent => turns.opponent_symbol(),
        }
    }
}

/// Builds the context for an activated event cell. Pure configuration; the
/// RNG is touched only by the chaos redraw.
pub fn plan(kind: EventKind, category: Category, rng: &mut impl rand::Rng) -> EventContext {
    if kind == EventKind::ChaosMode {
        let chosen = *CHAOS_CHOICES
            .choose(rng)
            .unwrap_or(&EventKind::DoubleCorrect);
        return plan(chosen, category, rng);
    }

    let mut ctx = EventContext::new(kind, category);
    match kind {
        EventKind::DoubleCorrect => {
            ctx.remaining = 2;
        }
        EventKind::DoubleMove => {
            ctx.effect = EffectPlan::Quiz(QuizPolicy {
                extra_turn: true,
                ..QuizPolicy::default()
            });
        }
        EventKind::ExtraTurnOrLose => {
            ctx.effect = EffectPlan::Quiz(QuizPolicy {
                extra_turn: true,
                lose_turn: true,
                ..QuizPolicy::default()
            });
        }
        EventKind::OpponentQuestion => {
            ctx.ask = AskTeam::Opponent;
        }
        EventKind::StealQuestion => {
            ctx.ask = AskTeam::Opponent;
            ctx.effect = EffectPlan::Quiz(QuizPolicy {
                opponent_rebound: true,
                ..QuizPolicy::default()
            });
        }
        EventKind::HintUnlock => {
            ctx.hint = true;
            ctx.time_bonus = 5;
        }
        EventKind::SwitchQuestion => {
            ctx.reroll.allowed = true;
        }
        EventKind::ChangeOwner => {
            ctx.effect = EffectPlan::StealTarget(TargetRequest::one_enemy_cell());
        }
        EventKind::RemoveOnly => {
            ctx.effect = EffectPlan::RemoveTarget(TargetRequest::one_enemy_cell());
        }
        EventKind::SwapTurn => {
            ctx.effect = EffectPlan::PassThenQuiz(QuizPolicy::default());
        }
        EventKind::FreeCapture => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::FreeCapture);
        }
        EventKind::OpponentCapture => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::OpponentCapture);
        }
        EventKind::LoseTurn => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::SkipTurn);
        }
        EventKind::BlockCell => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::BlockCell);
        }
        EventKind::NukeArea => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::NukeArea);
        }
        EventKind::ProtectCell => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::ProtectCell);
        }
        EventKind::ShuffleEvents => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::ShuffleEvents);
        }
        EventKind::SkipNextOpponent => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::SkipNextOpponent);
        }
        EventKind::ReverseOrder => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::ReverseOrder);
        }
        EventKind::TeamSwap => {
            ctx.effect = EffectPlan::Immediate(ImmediateEffect::SwapSymbols);
        }
        EventKind::ChaosMode => unreachable!("chaos replans before reaching here"),
    }
    ctx
}

/// String-boundary companion to [`plan`]: unrecognized identifiers degrade to
/// the single-question fallback instead of failing.
pub fn plan_id(raw: &str, category: Category, rng: &mut impl rand::Rng) -> EventContext {
    match raw.trim().to_ascii_uppercase().parse::<EventKind>() {
        Ok(kind) => plan(kind, category, rng),
        Err(_) => EventContext::fallback(category),
    }
}

/// Result of the immediate pass. `turn_ended` means the activation resolved
/// without a question; whether the seat advanced depends on the effect.
#[derive(Debug, Clone)]
pub struct ImmediateOutcome {
    pub turn_ended: bool,
    pub open_question: bool,
    pub winner: Option<Symbol>,
    pub events: Vec<GameEvent>,
}

impl ImmediateOutcome {
    fn question() -> Self {
        Self {
            turn_ended: false,
            open_question: true,
            winner: None,
            events: Vec::new(),
        }
    }

    fn resolved(&mut self) {
        self.turn_ended = true;
        self.open_question = false;
    }
}

/// Executes the context's immediate branch, if any. Branches that consume the
/// whole turn advance the seat themselves; marker effects (block, protect,
/// shuffle, reverse, skip-arm, symbol swap) leave the activating seat on the
/// move.
pub fn apply_immediate(
    ctx: &mut EventContext,
    turns: &mut TurnAuthority,
    board: &mut Board,
    pos: Position,
    rng: &mut impl rand::Rng,
) -> ImmediateOutcome {
    let mut out = ImmediateOutcome::question();

    match &mut ctx.effect {
        EffectPlan::Quiz(_) | EffectPlan::StealTarget(_) => {}
        EffectPlan::PassThenQuiz(_) => {
            turns.next_turn(true);
            out.events.push(GameEvent::TurnPassed {
                symbol: turns.current_symbol(),
            });
        }
        EffectPlan::RemoveTarget(request) => {
            for target in request.selected.drain(..) {
                let prev_owner = board.owner(target);
                board.clear_owner(target);
                out.events.push(GameEvent::CellRemoved {
                    pos: target,
                    prev_owner,
                });
            }
            turns.next_turn(true);
            out.resolved();
        }
        EffectPlan::Immediate(effect) => {
            apply_effect(*effect, turns, board, pos, rng, &mut out);
            out.resolved();
        }
    }
    out
}

fn apply_effect(
    effect: ImmediateEffect,
    turns: &mut TurnAuthority,
    board: &mut Board,
    pos: Position,
    rng: &mut impl rand::Rng,
    out: &mut ImmediateOutcome,
) {
    match effect {
        ImmediateEffect::FreeCapture => {
            let symbol = turns.current_symbol();
            capture_now(turns, board, pos, symbol, out);
        }
        ImmediateEffect::OpponentCapture => {
            let symbol = turns.opponent_symbol();
            capture_now(turns, board, pos, symbol, out);
        }
        ImmediateEffect::SkipTurn => {
            out.events.push(GameEvent::TurnLost {
                symbol: turns.current_symbol(),
            });
            turns.next_turn(true);
        }
        ImmediateEffect::BlockCell => {
            board.set_blocked(pos);
            out.events.push(GameEvent::CellBlocked { pos });
        }
        ImmediateEffect::NukeArea => {
            let mut cleared = 0;
            for target in board.neighborhood(pos, 1) {
                let protected = board.cell(target).is_some_and(|cell| cell.protected);
                if !protected {
                    if board.owner(target).is_some() {
                        cleared += 1;
                    }
                    board.clear_owner(target);
                }
            }
            out.events.push(GameEvent::AreaNuked {
                center: pos,
                cleared,
            });
            turns.next_turn(true);
        }
        ImmediateEffect::ProtectCell => {
            board.set_protected(pos);
            out.events.push(GameEvent::CellProtected { pos });
        }
        ImmediateEffect::ShuffleEvents => {
            let cells = shuffle_events(board, rng);
            out.events.push(GameEvent::EventsShuffled { cells });
        }
        ImmediateEffect::SkipNextOpponent => {
            let symbol = turns.opponent_symbol();
            turns.skip_next_for(symbol);
            out.events.push(GameEvent::SkipArmed { symbol });
        }
        ImmediateEffect::ReverseOrder => {
            turns.reverse_order();
            out.events.push(GameEvent::OrderReversed {
                direction: turns.direction(),
            });
        }
        ImmediateEffect::SwapSymbols => {
            if let Some((first, second)) = turns.swap_symbols() {
                out.events.push(GameEvent::SymbolsSwapped { first, second });
            }
        }
    }
}

/// Unconditional event capture. Protected and blocked cells shrug it off,
/// but the activation still consumed the turn.
fn capture_now(
    turns: &mut TurnAuthority,
    board: &mut Board,
    pos: Position,
    symbol: Symbol,
    out: &mut ImmediateOutcome,
) {
    let untouchable = board
        .cell(pos)
        .is_none_or(|cell| cell.protected || cell.blocked);
    if untouchable {
        turns.next_turn(true);
        return;
    }
    out.winner = turns.resolve_answer(board, pos, true, Some(symbol), true);
    out.events.push(GameEvent::CellCaptured { pos, symbol });
}

/// Permutes (category, identifier) tags among unowned event cells, keeping
/// each pair together so a pre-drawn identifier never strays from its
/// category.
fn shuffle_events(board: &mut Board, rng: &mut impl rand::Rng) -> usize {
    let positions: Vec<Position> = board
        .positions()
        .filter(|pos| {
            board
                .cell(*pos)
                .is_some_and(|cell| cell.owner.is_none() && cell.category.is_some())
        })
        .collect();

    let mut tags: Vec<(Category, Option<EventKind>)> = positions
        .iter()
        .filter_map(|pos| board.cell(*pos))
        .filter_map(|cell| cell.category.map(|category| (category, cell.event)))
        .collect();
    tags.shuffle(rng);

    for (pos, (category, kind)) in positions.iter().zip(tags) {
        board.set_event(*pos, category, kind);
    }
    positions.len()
}

#[derive(Debug, Clone, Default)]
pub struct AnswerOutcome {
    pub ask_more: bool,
    pub captured: bool,
    pub extra_turn: bool,
    pub resolution_complete: bool,
    pub events: Vec<GameEvent>,
}

/// Feeds one answer into the context.
///
/// A steal plan resolves its target here and signals `resolution_complete`;
/// the triggering cell still goes through the authority's generic answer
/// resolution afterwards. Otherwise: an incorrect answer ends the chain
/// (except the one rebound round a steal-question offers), a correct answer
/// decrements the chain and finally captures for the answering seat when the
/// policy says so and the cell is neither protected nor blocked.
pub fn resolve_answer(
    ctx: &mut EventContext,
    turns: &mut TurnAuthority,
    board: &mut Board,
    pos: Position,
    was_correct: bool,
) -> AnswerOutcome {
    let mut out = AnswerOutcome::default();

    if let EffectPlan::StealTarget(request) = &ctx.effect {
        if was_correct {
            if let Some(target) = request.selected.first().copied() {
                let thief = turns.current_symbol();
                let from = board.owner(target);
                board.set_owner(target, thief);
                out.captured = true;
                out.events.push(GameEvent::OwnerStolen {
                    pos: target,
                    from,
                    to: thief,
                });
            }
            out.resolution_complete = true;
            return out;
        }
    }

    let policy = ctx.quiz_policy();

    if !was_correct {
        if policy.opponent_rebound && ctx.ask == AskTeam::Opponent && !ctx.rebound_used {
            ctx.rebound_used = true;
            ctx.ask = AskTeam::Current;
            out.ask_more = true;
            out.events.push(GameEvent::ReboundOffered {
                symbol: ctx.answering_symbol(turns),
            });
        }
        return out;
    }

    ctx.remaining = ctx.remaining.saturating_sub(1);
    if ctx.remaining > 0 {
        out.ask_more = true;
    } else if policy.capture {
        let capturable = board
            .cell(pos)
            .is_some_and(|cell| !cell.protected && !cell.blocked);
        if capturable {
            let symbol = ctx.answering_symbol(turns);
            board.set_owner(pos, symbol);
            out.captured = true;
            out.events.push(GameEvent::CellCaptured { pos, symbol });
        }
    }

    if policy.extra_turn {
        out.extra_turn = true;
    }
    out
}

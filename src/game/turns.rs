use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::game::players::Player;
use crate::types::{Symbol, TurnDirection};

/// Win-scan axes: vertical, horizontal, both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

pub const DEFAULT_WIN_LENGTH: usize = 5;

/// One resolved answer, appended whether or not it captured anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub row: usize,
    pub col: usize,
    pub symbol: Symbol,
    pub was_correct: bool,
}

/// Seat order, direction and the ownership rules applied when an answer
/// round closes. Board mutations all pass through [`resolve_answer`].
///
/// [`resolve_answer`]: TurnAuthority::resolve_answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnAuthority {
    players: Vec<Player>,
    current: usize,
    direction: TurnDirection,
    skip_symbol: Option<Symbol>,
    win_length: usize,
    match_log: Vec<MatchRecord>,
}

impl TurnAuthority {
    pub fn new(players: Vec<Player>, win_length: usize) -> Self {
        assert!(!players.is_empty(), "turn order needs at least one seat");
        Self {
            players,
            current: 0,
            direction: TurnDirection::Forward,
            skip_symbol: None,
            win_length,
            match_log: Vec::new(),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn current_symbol(&self) -> Symbol {
        self.players[self.current].symbol
    }

    /// Next seat along the current direction.
    pub fn opponent_index(&self) -> usize {
        self.offset(self.current)
    }

    pub fn opponent_symbol(&self) -> Symbol {
        self.players[self.opponent_index()].symbol
    }

    pub fn direction(&self) -> TurnDirection {
        self.direction
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    pub fn match_log(&self) -> &[MatchRecord] {
        &self.match_log
    }

    pub fn pending_skip(&self) -> Option<Symbol> {
        self.skip_symbol
    }

    fn offset(&self, from: usize) -> usize {
        let len = self.players.len() as isize;
        (from as isize + self.direction.delta()).rem_euclid(len) as usize
    }

    /// Advances the seat by one step of the current direction. An armed skip
    /// stays armed until the seat it names comes up, then fires exactly once.
    pub fn next_turn(&mut self, apply_skip: bool) {
        self.current = self.offset(self.current);
        if apply_skip {
            if let Some(skip) = self.skip_symbol {
                if self.current_player().symbol == skip {
                    self.current = self.offset(self.current);
                    self.skip_symbol = None;
                }
            }
        }
    }

    /// Flips direction without moving the seat; felt from the next advance.
    pub fn reverse_order(&mut self) {
        self.direction = self.direction.reversed();
    }

    /// Arms a one-shot skip against `symbol`'s next turn.
    pub fn skip_next_for(&mut self, symbol: Symbol) {
        self.skip_symbol = Some(symbol);
    }

    /// Trades the first two seats' symbols. Cell marks are untouched, so the
    /// swap exchanges the teams' territory wholesale.
    pub fn swap_symbols(&mut self) -> Option<(Symbol, Symbol)> {
        if self.players.len() < 2 {
            return None;
        }
        let a = self.players[0].symbol;
        let b = self.players[1].symbol;
        self.players[0].symbol = b;
        self.players[1].symbol = a;
        Some((a, b))
    }

    pub fn set_score(&mut self, symbol: Symbol, score: u32) {
        if let Some(player) = self.players.iter_mut().find(|p| p.symbol == symbol) {
            player.score = score;
        }
    }

    /// Closes an answer round for `pos`.
    ///
    /// Ownership: an explicit `capture_symbol` is written as given (events
    /// re-affirm owners they already set); otherwise a correct answer claims
    /// an unowned cell for the current seat and an owner already present is
    /// never overwritten. The round is logged unconditionally, the win check
    /// runs only when the cell ended up owned, and the seat advances when
    /// nobody won and `advance_turn` is set.
    pub fn resolve_answer(
        &mut self,
        board: &mut Board,
        pos: Position,
        was_correct: bool,
        capture_symbol: Option<Symbol>,
        advance_turn: bool,
    ) -> Option<Symbol> {
        let acting = capture_symbol.unwrap_or_else(|| self.current_symbol());

        if was_correct {
            match capture_symbol {
                Some(symbol) => board.set_owner(pos, symbol),
                None => {
                    if board.owner(pos).is_none() {
                        let symbol = self.current_symbol();
                        board.set_owner(pos, symbol);
                    }
                }
            }
        }

        self.match_log.push(MatchRecord {
            row: pos.row,
            col: pos.col,
            symbol: acting,
            was_correct,
        });

        let mut winner = None;
        if was_correct {
            if let Some(owner) = board.owner(pos) {
                if self.check_win_from(board, pos, owner) {
                    winner = Some(owner);
                }
            }
        }

        if winner.is_none() && advance_turn {
            self.next_turn(true);
        }
        winner
    }

    /// True when a contiguous same-owner run of at least `win_length` passes
    /// through `pos` on any scan axis.
    pub fn check_win_from(&self, board: &Board, pos: Position, symbol: Symbol) -> bool {
        for (dr, dc) in DIRECTIONS {
            let run = 1
                + run_length(board, pos, symbol, -dr, -dc)
                + run_length(board, pos, symbol, dr, dc);
            if run >= self.win_length {
                return true;
            }
        }
        false
    }

    /// Blocked cells can never be filled, so they count as settled here.
    pub fn is_board_full(&self, board: &Board) -> bool {
        board.positions().all(|pos| {
            board
                .cell(pos)
                .is_none_or(|cell| cell.owner.is_some() || cell.blocked)
        })
    }

    pub fn owner_counts(&self, board: &Board) -> HashMap<Symbol, usize> {
        board.positions().filter_map(|pos| board.owner(pos)).counts()
    }

    /// Strict-plurality owner of a full board; a top-two tie is a draw.
    pub fn majority_winner(&self, board: &Board) -> Option<Symbol> {
        let ranked: Vec<(Symbol, usize)> = self
            .owner_counts(board)
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .collect();
        match ranked.as_slice() {
            [] => None,
            [(symbol, _)] => Some(*symbol),
            [(first, top), (_, runner_up), ..] => (top > runner_up).then_some(*first),
        }
    }
}

fn run_length(board: &Board, from: Position, symbol: Symbol, dr: isize, dc: isize) -> usize {
    let size = board.size() as isize;
    let mut count = 0;
    let mut row = from.row as isize + dr;
    let mut col = from.col as isize + dc;
    while row >= 0 && col >= 0 && row < size && col < size {
        let pos = Position::new(row as usize, col as usize);
        if board.owner(pos) != Some(symbol) {
            break;
        }
        count += 1;
        row += dr;
        col += dc;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(seats: usize) -> TurnAuthority {
        TurnAuthority::new(Player::roster(seats), DEFAULT_WIN_LENGTH)
    }

    fn sym(mark: char) -> Symbol {
        Symbol::new(mark)
    }

    #[test]
    fn turns_rotate_forward_then_reverse() {
        let mut turns = authority(3);
        assert_eq!(turns.current_index(), 0);
        turns.next_turn(true);
        turns.next_turn(true);
        assert_eq!(turns.current_index(), 2);

        turns.reverse_order();
        assert_eq!(turns.current_index(), 2, "reversal waits for the next advance");
        turns.next_turn(true);
        assert_eq!(turns.current_index(), 1);
        turns.next_turn(true);
        assert_eq!(turns.current_index(), 0);
        turns.next_turn(true);
        assert_eq!(turns.current_index(), 2, "reverse wraps to the last seat");
    }

    #[test]
    fn armed_skip_waits_for_its_seat_and_fires_once() {
        let mut turns = authority(3);
        turns.skip_next_for(sym('C'));

        turns.next_turn(true);
        assert_eq!(turns.current_index(), 1);
        assert_eq!(turns.pending_skip(), Some(sym('C')), "skip survives a non-matching advance");

        turns.next_turn(true);
        assert_eq!(turns.current_index(), 0, "C's seat is passed over");
        assert_eq!(turns.pending_skip(), None);

        turns.next_turn(true);
        turns.next_turn(true);
        assert_eq!(turns.current_index(), 2, "C plays normally afterwards");
    }

    #[test]
    fn resolve_answer_claims_only_unowned_cells() {
        let mut turns = authority(2);
        let mut board = Board::new(5);
        let pos = Position::new(2, 2);

        let winner = turns.resolve_answer(&mut board, pos, true, None, true);
        assert_eq!(winner, None);
        assert_eq!(board.owner(pos), Some(sym('A')));
        assert_eq!(turns.current_index(), 1);

        // B answers correctly on the same cell; A's mark stays.
        let winner = turns.resolve_answer(&mut board, pos, true, None, true);
        assert_eq!(winner, None);
        assert_eq!(board.owner(pos), Some(sym('A')));
        assert_eq!(turns.match_log().len(), 2);
    }

    #[test]
    fn incorrect_answer_logs_without_capturing() {
        let mut turns = authority(2);
        let mut board = Board::new(5);
        let pos = Position::new(0, 0);

        turns.resolve_answer(&mut board, pos, false, None, true);
        assert_eq!(board.owner(pos), None);
        assert_eq!(
            turns.match_log(),
            &[MatchRecord {
                row: 0,
                col: 0,
                symbol: sym('A'),
                was_correct: false,
            }]
        );
        assert_eq!(turns.current_index(), 1);
    }

    #[test]
    fn explicit_capture_symbol_is_written_as_given() {
        let mut turns = authority(2);
        let mut board = Board::new(5);
        let pos = Position::new(1, 3);

        turns.resolve_answer(&mut board, pos, true, Some(sym('B')), false);
        assert_eq!(board.owner(pos), Some(sym('B')));
        assert_eq!(turns.current_index(), 0, "advance_turn=false holds the seat");
        assert_eq!(turns.match_log()[0].symbol, sym('B'));
    }

    #[test]
    fn win_needs_the_full_run() {
        let mut turns = TurnAuthority::new(Player::roster(2), 3);
        let mut board = Board::new(5);
        board.set_owner(Position::new(2, 1), sym('A'));
        board.set_owner(Position::new(2, 2), sym('A'));

        assert!(!turns.check_win_from(&board, Position::new(2, 2), sym('A')));

        board.set_owner(Position::new(2, 3), sym('A'));
        assert!(turns.check_win_from(&board, Position::new(2, 2), sym('A')));
        assert!(turns.check_win_from(&board, Position::new(2, 1), sym('A')));

        let winner = turns.resolve_answer(&mut board, Position::new(2, 3), true, None, true);
        assert_eq!(winner, Some(sym('A')));
        assert_eq!(turns.current_index(), 0, "a win never advances the seat");
    }

    #[test]
    fn diagonal_runs_count() {
        let turns = TurnAuthority::new(Player::roster(2), 3);
        let mut board = Board::new(5);
        for i in 0..3 {
            board.set_owner(Position::new(i, 4 - i), sym('B'));
        }
        assert!(turns.check_win_from(&board, Position::new(1, 3), sym('B')));
    }

    #[test]
    fn majority_winner_on_full_board() {
        let turns = authority(2);
        let mut board = Board::new(2);
        board.set_owner(Position::new(0, 0), sym('A'));
        board.set_owner(Position::new(0, 1), sym('A'));
        board.set_owner(Position::new(1, 0), sym('B'));
        assert!(!turns.is_board_full(&board));

        board.set_owner(Position::new(1, 1), sym('A'));
        assert!(turns.is_board_full(&board));
        assert_eq!(turns.majority_winner(&board), Some(sym('A')));
    }

    #[test]
    fn tied_full_board_is_a_draw() {
        let turns = authority(2);
        let mut board = Board::new(2);
        board.set_owner(Position::new(0, 0), sym('A'));
        board.set_owner(Position::new(0, 1), sym('A'));
        board.set_owner(Position::new(1, 0), sym('B'));
        board.set_owner(Position::new(1, 1), sym('B'));
        assert_eq!(turns.majority_winner(&board), None);
    }

    #[test]
    fn blocked_cells_count_as_settled() {
        let turns = authority(2);
        let mut board = Board::new(2);
        board.set_owner(Position::new(0, 0), sym('A'));
        board.set_owner(Position::new(0, 1), sym('A'));
        board.set_owner(Position::new(1, 0), sym('B'));
        board.set_blocked(Position::new(1, 1));
        assert!(turns.is_board_full(&board));
        assert_eq!(turns.majority_winner(&board), Some(sym('A')));
    }

    #[test]
    fn symbol_swap_trades_the_first_two_seats() {
        let mut turns = authority(3);
        let swapped = turns.swap_symbols();
        assert_eq!(swapped, Some((sym('A'), sym('B'))));
        assert_eq!(turns.players()[0].symbol, sym('B'));
        assert_eq!(turns.players()[1].symbol, sym('A'));
        assert_eq!(turns.players()[2].symbol, sym('C'));
    }
}

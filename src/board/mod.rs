use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::events::catalog::{self, EventKind};
use crate::types::{Category, Symbol};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub owner: Option<Symbol>,
    pub category: Option<Category>,
    pub event: Option<EventKind>,
    pub protected: bool,
    pub blocked: bool,
}

impl Cell {
    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    /// Activatable: unowned and not locked shut.
    pub fn is_free(&self) -> bool {
        self.owner.is_none() && !self.blocked
    }

    pub fn has_event(&self) -> bool {
        self.category.is_some() || self.event.is_some()
    }
}

/// How event tiles get scattered over a fresh board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignMode {
    /// `event_cells` distinct empty cells each get a uniformly drawn category;
    /// the concrete identifier is drawn later, at activation time.
    Random { event_cells: usize },
    /// Every pooled identifier lands on its own cell (positions shuffled),
    /// with the identifier fixed up front. Exercises the whole catalog.
    Exhaustive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Board {
            size,
            cells: vec![Cell::default(); size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if self.in_bounds(pos) {
            self.cells.get(pos.row * self.size + pos.col)
        } else {
            None
        }
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if self.in_bounds(pos) {
            self.cells.get_mut(pos.row * self.size + pos.col)
        } else {
            None
        }
    }

    pub fn owner(&self, pos: Position) -> Option<Symbol> {
        self.cell(pos).and_then(|cell| cell.owner)
    }

    pub fn set_owner(&mut self, pos: Position, symbol: Symbol) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.owner = Some(symbol);
        }
    }

    pub fn clear_owner(&mut self, pos: Position) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.owner = None;
        }
    }

    /// Locks the cell shut. Blocking is terminal and also strips any event
    /// the cell still carried.
    pub fn set_blocked(&mut self, pos: Position) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.blocked = true;
            cell.category = None;
            cell.event = None;
        }
    }

    pub fn set_protected(&mut self, pos: Position) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.protected = true;
        }
    }

    pub fn set_event(&mut self, pos: Position, category: Category, kind: Option<EventKind>) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.category = Some(category);
            cell.event = kind;
        }
    }

    pub fn clear_event(&mut self, pos: Position) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.category = None;
            cell.event = None;
        }
    }

    /// Pins a drawn identifier to the cell so a later re-activation of the
    /// same cell replays the same event.
    pub fn record_drawn_event(&mut self, pos: Position, kind: EventKind) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.event = Some(kind);
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Position::new(row, col)))
    }

    /// Clipped square neighborhood of `center`, center included. Coordinates
    /// past the rim are excluded, never wrapped.
    pub fn neighborhood(&self, center: Position, radius: usize) -> SmallVec<[Position; 9]> {
        let mut out = SmallVec::new();
        let row_lo = center.row.saturating_sub(radius);
        let col_lo = center.col.saturating_sub(radius);
        let row_hi = (center.row + radius).min(self.size.saturating_sub(1));
        let col_hi = (center.col + radius).min(self.size.saturating_sub(1));
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                out.push(Position::new(row, col));
            }
        }
        out
    }

    pub fn assign_events(&mut self, mode: AssignMode, rng: &mut impl rand::Rng) {
        let mut eligible: Vec<Position> = self
            .positions()
            .filter(|pos| {
                let cell = &self.cells[pos.row * self.size + pos.col];
                cell.owner.is_none() && !cell.blocked && !cell.has_event()
            })
            .collect();
        eligible.shuffle(rng);

        match mode {
            AssignMode::Random { event_cells } => {
                for pos in eligible.into_iter().take(event_cells) {
                    let category = *Category::ALL
                        .choose(rng)
                        .unwrap_or(&Category::Bonus);
                    self.set_event(pos, category, None);
                }
            }
            AssignMode::Exhaustive => {
                for (pos, kind) in eligible.into_iter().zip(catalog::pooled_kinds()) {
                    self.set_event(pos, kind.category(), Some(kind));
                }
            }
        }
    }
}

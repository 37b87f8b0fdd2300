//! Board grid: cells, roles, bounds. Shared by all three boards.

use crate::rng::Rng;
use thiserror::Error;

/// Symbol index into the active palette (0..palette_size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub u8);

/// Special symbols the swap board substitutes for long-run heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKind {
    /// Head of a 4-run.
    Bomb,
    /// Head of a 5-or-longer run.
    Rainbow,
}

/// What an occupied cell is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Ordinary,
    Special(SpecialKind),
    /// Matches like an ordinary cell but never falls and is never part of
    /// a player-controlled capsule (the "target" cells of the capsule game).
    Blocking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Occupied { symbol: Symbol, role: Role },
}

impl Cell {
    pub fn ordinary(symbol: Symbol) -> Self {
        Self::Occupied {
            symbol,
            role: Role::Ordinary,
        }
    }

    pub fn blocking(symbol: Symbol) -> Self {
        Self::Occupied {
            symbol,
            role: Role::Blocking,
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Self::Empty => None,
            Self::Occupied { symbol, .. } => Some(*symbol),
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Occupied {
                role: Role::Blocking,
                ..
            }
        )
    }

    /// Eligible to move under gravity: occupied and not a blocking cell.
    pub fn falls(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Occupied { role, .. } => match role {
                Role::Ordinary | Role::Special(_) => true,
                Role::Blocking => false,
            },
        }
    }
}

/// Grid coordinate; row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True if the two positions share a row or column edge.
    pub fn is_adjacent(&self, other: &Self) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr + dc == 1
    }
}

#[derive(Debug, Error)]
#[error("position ({row}, {col}) outside {rows}x{cols} grid")]
pub struct BoundsError {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Fixed-size cell grid. Out-of-bounds writes are a caller bug: they
/// debug_assert and are dropped in release.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        if self.in_bounds(pos) {
            Some(self.cells[pos.row * self.cols + pos.col])
        } else {
            None
        }
    }

    /// Checked accessor for callers that validate positions up front.
    pub fn cell(&self, pos: Pos) -> Result<Cell, BoundsError> {
        self.get(pos).ok_or(BoundsError {
            row: pos.row,
            col: pos.col,
            rows: self.rows,
            cols: self.cols,
        })
    }

    #[inline]
    pub fn set(&mut self, pos: Pos, cell: Cell) {
        debug_assert!(self.in_bounds(pos), "set out of bounds: {pos:?}");
        if self.in_bounds(pos) {
            self.cells[pos.row * self.cols + pos.col] = cell;
        }
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.get(pos) == Some(Cell::Empty)
    }

    pub fn swap(&mut self, a: Pos, b: Pos) {
        if self.in_bounds(a) && self.in_bounds(b) {
            let ia = a.row * self.cols + a.col;
            let ib = b.row * self.cols + b.col;
            self.cells.swap(ia, ib);
        }
    }

    /// Number of blocking cells still on the board (capsule win condition).
    pub fn blocking_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_blocking()).count()
    }

    /// Fill every Empty cell with a fresh ordinary symbol from the palette.
    pub fn fill_random(&mut self, palette_size: u8, rng: &mut Rng) {
        for cell in &mut self.cells {
            if *cell == Cell::Empty {
                *cell = Cell::ordinary(Symbol(rng.below(u32::from(palette_size)) as u8));
            }
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_all_empty() {
        let g = Grid::new(8, 8);
        assert!(g.positions().all(|p| g.is_empty(p)));
    }

    #[test]
    fn set_get_roundtrip() {
        let mut g = Grid::new(4, 4);
        let p = Pos::new(2, 3);
        g.set(p, Cell::ordinary(Symbol(1)));
        assert_eq!(g.get(p), Some(Cell::ordinary(Symbol(1))));
        assert!(!g.is_empty(p));
    }

    #[test]
    fn out_of_bounds_get_is_none() {
        let g = Grid::new(4, 4);
        assert_eq!(g.get(Pos::new(4, 0)), None);
        assert_eq!(g.get(Pos::new(0, 4)), None);
        assert!(g.cell(Pos::new(9, 9)).is_err());
    }

    #[test]
    fn adjacency_is_orthogonal_only() {
        let p = Pos::new(3, 3);
        assert!(p.is_adjacent(&Pos::new(3, 4)));
        assert!(p.is_adjacent(&Pos::new(2, 3)));
        assert!(!p.is_adjacent(&Pos::new(2, 4)));
        assert!(!p.is_adjacent(&Pos::new(3, 3)));
        assert!(!p.is_adjacent(&Pos::new(3, 5)));
    }

    #[test]
    fn blocking_cells_never_fall() {
        assert!(!Cell::blocking(Symbol(0)).falls());
        assert!(Cell::ordinary(Symbol(0)).falls());
        assert!(!Cell::Empty.falls());
    }

    #[test]
    fn fill_random_leaves_no_empty() {
        let mut g = Grid::new(6, 6);
        let mut rng = Rng::new(1);
        g.set(Pos::new(0, 0), Cell::blocking(Symbol(2)));
        g.fill_random(4, &mut rng);
        assert!(g.positions().all(|p| !g.is_empty(p)));
        // Pre-existing cells are untouched.
        assert!(g.get(Pos::new(0, 0)).unwrap().is_blocking());
    }
}

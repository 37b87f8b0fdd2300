//! The two-cell falling capsule: movement, rotation, collision, locking.

use crate::grid::{Cell, Grid, Pos, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Second cell one column to the right of the first.
    Horizontal,
    /// Second cell one row above the first.
    Vertical,
}

/// A falling capsule. `row`/`col` locate the first cell; the second is one
/// grid step away along the orientation axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capsule {
    pub row: i32,
    pub col: i32,
    pub orientation: Orientation,
    pub symbol_a: Symbol,
    pub symbol_b: Symbol,
}

impl Capsule {
    pub fn new(row: i32, col: i32, symbol_a: Symbol, symbol_b: Symbol) -> Self {
        Self {
            row,
            col,
            orientation: Orientation::Horizontal,
            symbol_a,
            symbol_b,
        }
    }

    /// Both cells with their symbols, first then second.
    pub fn cells(&self) -> [(i32, i32, Symbol); 2] {
        let (br, bc) = self.second_cell();
        [(self.row, self.col, self.symbol_a), (br, bc, self.symbol_b)]
    }

    fn second_cell(&self) -> (i32, i32) {
        match self.orientation {
            Orientation::Horizontal => (self.row, self.col + 1),
            Orientation::Vertical => (self.row - 1, self.col),
        }
    }

    /// True iff both cells, after the delta, are in-bounds and Empty.
    pub fn can_move(&self, grid: &Grid, drow: i32, dcol: i32) -> bool {
        self.cells()
            .iter()
            .all(|&(r, c, _)| cell_free(grid, r + drow, c + dcol))
    }

    /// Unconditional coordinate update; callers check `can_move` first.
    pub fn shift(&mut self, drow: i32, dcol: i32) {
        self.row += drow;
        self.col += dcol;
    }

    /// Pivot the second cell 90 degrees around the first. A rotation whose
    /// target cell is out-of-bounds or occupied is a no-op, never an error.
    pub fn rotate(&mut self, grid: &Grid) {
        let target_orientation = match self.orientation {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        };
        let mut rotated = self.clone();
        rotated.orientation = target_orientation;
        // Coming back to horizontal the halves have traded places visually.
        if target_orientation == Orientation::Horizontal {
            std::mem::swap(&mut rotated.symbol_a, &mut rotated.symbol_b);
        }
        let (br, bc) = rotated.second_cell();
        if cell_free(grid, br, bc) {
            *self = rotated;
        }
    }

    /// Freeze both cells into the grid as ordinary cells. The state machine
    /// guarantees both positions are free when this is called.
    pub fn lock(&self, grid: &mut Grid) {
        for (r, c, symbol) in self.cells() {
            if r >= 0 && c >= 0 {
                grid.set(Pos::new(r as usize, c as usize), Cell::ordinary(symbol));
            }
        }
    }
}

fn cell_free(grid: &Grid, row: i32, col: i32) -> bool {
    if row < 0 || col < 0 {
        return false;
    }
    let pos = Pos::new(row as usize, col as usize);
    grid.in_bounds(pos) && grid.is_empty(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Grid, Pos, Symbol};

    fn capsule_at(row: i32, col: i32) -> Capsule {
        Capsule::new(row, col, Symbol(0), Symbol(1))
    }

    #[test]
    fn descends_into_empty_space() {
        // Capsule at row 0 cols 3-4, row 1 empty below both halves.
        let g = Grid::new(10, 20);
        let mut p = capsule_at(0, 3);
        assert!(p.can_move(&g, 1, 0));
        p.shift(1, 0);
        let cells = p.cells();
        assert_eq!((cells[0].0, cells[0].1), (1, 3));
        assert_eq!((cells[1].0, cells[1].1), (1, 4));
    }

    #[test]
    fn blocked_by_occupied_cell() {
        let mut g = Grid::new(10, 8);
        g.set(Pos::new(1, 4), Cell::ordinary(Symbol(2)));
        let p = capsule_at(0, 3);
        assert!(!p.can_move(&g, 1, 0));
        assert!(p.can_move(&g, 0, -1));
    }

    #[test]
    fn cannot_leave_the_grid() {
        let g = Grid::new(10, 8);
        let p = capsule_at(0, 0);
        assert!(!p.can_move(&g, 0, -1));
        let right = capsule_at(0, 6); // second cell at col 7, the last column
        assert!(!right.can_move(&g, 0, 1));
        let bottom = capsule_at(9, 0);
        assert!(!bottom.can_move(&g, 1, 0));
    }

    #[test]
    fn rotation_pivots_second_cell_above_first() {
        let g = Grid::new(10, 8);
        let mut p = capsule_at(2, 3);
        p.rotate(&g);
        assert_eq!(p.orientation, Orientation::Vertical);
        let cells = p.cells();
        assert_eq!((cells[0].0, cells[0].1), (2, 3));
        assert_eq!((cells[1].0, cells[1].1), (1, 3));
    }

    #[test]
    fn rotation_into_occupied_cell_is_a_noop() {
        let mut g = Grid::new(10, 8);
        g.set(Pos::new(1, 3), Cell::ordinary(Symbol(2)));
        let mut p = capsule_at(2, 3);
        let before = p.clone();
        p.rotate(&g);
        assert_eq!(p, before);
    }

    #[test]
    fn rotation_at_top_row_is_a_noop() {
        let g = Grid::new(10, 8);
        let mut p = capsule_at(0, 3);
        let before = p.clone();
        p.rotate(&g);
        assert_eq!(p, before);
    }

    #[test]
    fn full_rotation_swaps_symbol_order() {
        let g = Grid::new(10, 8);
        let mut p = Capsule::new(5, 3, Symbol(0), Symbol(1));
        p.rotate(&g);
        assert_eq!((p.symbol_a, p.symbol_b), (Symbol(0), Symbol(1)));
        p.rotate(&g);
        assert_eq!(p.orientation, Orientation::Horizontal);
        assert_eq!((p.symbol_a, p.symbol_b), (Symbol(1), Symbol(0)));
    }

    #[test]
    fn lock_writes_both_symbols() {
        let mut g = Grid::new(10, 8);
        let p = capsule_at(9, 2);
        p.lock(&mut g);
        assert_eq!(g.get(Pos::new(9, 2)), Some(Cell::ordinary(Symbol(0))));
        assert_eq!(g.get(Pos::new(9, 3)), Some(Cell::ordinary(Symbol(1))));
    }
}

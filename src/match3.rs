//! Swap board: 8x8 cursor-driven match-3 with refill-in-place resolution.

use crate::cascade::{self, ResolvePolicy};
use crate::grid::{Grid, Pos};
use crate::matcher;
use crate::rng::Rng;
use crate::sfx::{Cue, Cues};

pub const ROWS: usize = 8;
pub const COLS: usize = 8;

/// Run length times this per matched run.
pub const POINTS_PER_CELL: u32 = 20;

/// Score needed to finish a level grows linearly.
fn level_target(level: u32) -> u32 {
    level * 1000
}

/// Palette grows with level: 4 symbols at level 1, capped at 7.
pub fn palette_size(level: u32) -> u8 {
    (3 + level).min(7) as u8
}

#[derive(Debug)]
pub struct SwapBoard {
    pub grid: Grid,
    pub cursor: Pos,
    /// First cell of a pending swap, if the player has picked one.
    pub selected: Option<Pos>,
    pub score: u32,
    pub level: u32,
    /// Positions matched by the last resolved swap, for transient effects.
    pub last_matched: Vec<Pos>,
    pub cues: Cues,
    /// Set when a level target was just reached; the shell shows a banner
    /// and clears it.
    pub level_cleared: bool,
    rng: Rng,
}

impl SwapBoard {
    pub fn new(seed: u32) -> Self {
        let mut board = Self {
            grid: Grid::new(ROWS, COLS),
            cursor: Pos::new(ROWS / 2, COLS / 2),
            selected: None,
            score: 0,
            level: 1,
            last_matched: Vec::new(),
            cues: Cues::default(),
            level_cleared: false,
            rng: Rng::new(seed),
        };
        board.regenerate();
        board
    }

    /// Fill the board with random symbols, redrawing until no run exists so
    /// the player always starts from a stable grid.
    fn regenerate(&mut self) {
        self.grid = Grid::new(ROWS, COLS);
        self.grid.fill_random(palette_size(self.level), &mut self.rng);
        loop {
            let matched = matcher::find_matches(&self.grid);
            if matched.is_empty() {
                break;
            }
            for pos in matched {
                self.grid.set(pos, crate::grid::Cell::Empty);
            }
            self.grid.fill_random(palette_size(self.level), &mut self.rng);
        }
    }

    pub fn move_cursor(&mut self, drow: i32, dcol: i32) {
        let row = (self.cursor.row as i32 + drow).clamp(0, ROWS as i32 - 1) as usize;
        let col = (self.cursor.col as i32 + dcol).clamp(0, COLS as i32 - 1) as usize;
        self.cursor = Pos::new(row, col);
    }

    /// Pick the cell under the cursor: first pick selects, picking it again
    /// deselects, an adjacent second pick attempts the swap. A non-adjacent
    /// second pick is silently rejected.
    pub fn select(&mut self) {
        match self.selected {
            None => self.selected = Some(self.cursor),
            Some(sel) if sel == self.cursor => self.selected = None,
            Some(sel) if sel.is_adjacent(&self.cursor) => {
                self.try_swap(sel, self.cursor);
                self.selected = None;
            }
            Some(_) => {}
        }
    }

    /// Swap two adjacent cells and resolve. A swap that produces no match is
    /// reverted with no score effect.
    fn try_swap(&mut self, a: Pos, b: Pos) {
        self.grid.swap(a, b);
        if matcher::find_matches(&self.grid).is_empty() {
            self.grid.swap(a, b);
            return;
        }
        self.last_matched = matcher::find_matches(&self.grid).into_iter().collect();
        let resolution = cascade::resolve(
            &mut self.grid,
            ResolvePolicy::RefillInPlace {
                points_per_cell: POINTS_PER_CELL,
            },
            palette_size(self.level),
            &mut self.rng,
        );
        self.score += resolution.score_delta;
        self.cues.push(Cue::Match);
        if self.score >= level_target(self.level) {
            self.level_up();
        }
    }

    /// Reaching the target regenerates the board with a wider palette.
    /// Score persists across level-ups; only a new game resets it.
    fn level_up(&mut self) {
        self.level += 1;
        self.level_cleared = true;
        self.cues.push(Cue::Clear);
        self.selected = None;
        self.regenerate();
    }

    /// Progress toward the current level target, 0..=1, for the UI gauge.
    pub fn level_progress(&self) -> f64 {
        let prev = level_target(self.level.saturating_sub(1));
        let span = level_target(self.level).saturating_sub(prev).max(1);
        f64::from(self.score.saturating_sub(prev).min(span)) / f64::from(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Symbol};

    #[test]
    fn new_board_is_stable_and_full() {
        let b = SwapBoard::new(42);
        assert!(matcher::find_matches(&b.grid).is_empty());
        assert!(b.grid.positions().all(|p| !b.grid.is_empty(p)));
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut b = SwapBoard::new(1);
        for _ in 0..20 {
            b.move_cursor(0, 1);
        }
        assert_eq!(b.cursor.col, COLS - 1);
        for _ in 0..20 {
            b.move_cursor(-1, 0);
        }
        assert_eq!(b.cursor.row, 0);
    }

    #[test]
    fn selecting_same_cell_twice_deselects() {
        let mut b = SwapBoard::new(1);
        b.select();
        assert_eq!(b.selected, Some(b.cursor));
        b.select();
        assert_eq!(b.selected, None);
    }

    #[test]
    fn non_adjacent_second_pick_is_rejected() {
        let mut b = SwapBoard::new(1);
        b.cursor = Pos::new(0, 0);
        b.select();
        b.cursor = Pos::new(4, 4);
        let grid_before = b.grid.clone();
        b.select();
        assert_eq!(b.selected, Some(Pos::new(0, 0)));
        assert_eq!(b.grid, grid_before);
        assert_eq!(b.score, 0);
    }

    #[test]
    fn swap_without_match_reverts() {
        let mut b = SwapBoard::new(7);
        // Craft a grid where a specific swap cannot match: checker of 2x2
        // blocks never has a 3-run even after one swap of two equal cells.
        for p in b.grid.clone().positions() {
            let sym = ((p.row / 2 + p.col / 2) % 2) as u8;
            b.grid.set(p, Cell::ordinary(Symbol(sym)));
        }
        let before = b.grid.clone();
        b.cursor = Pos::new(0, 0);
        b.select();
        b.cursor = Pos::new(0, 1);
        b.select();
        assert_eq!(b.grid, before);
        assert_eq!(b.score, 0);
        assert_eq!(b.selected, None);
    }

    #[test]
    fn matching_swap_scores_and_refills() {
        let mut b = SwapBoard::new(3);
        // Symbols 8/9 never come out of the random palette, so only these
        // crafted cells can form a 9-run, and only after the swap.
        b.grid.set(Pos::new(7, 0), Cell::ordinary(Symbol(9)));
        b.grid.set(Pos::new(7, 1), Cell::ordinary(Symbol(9)));
        b.grid.set(Pos::new(7, 2), Cell::ordinary(Symbol(8)));
        b.grid.set(Pos::new(6, 2), Cell::ordinary(Symbol(9)));
        assert!(matcher::find_matches(&b.grid).is_empty());
        b.cursor = Pos::new(7, 2);
        b.select();
        b.cursor = Pos::new(6, 2);
        b.select();
        assert!(b.score >= 3 * POINTS_PER_CELL);
        assert!(matcher::find_matches(&b.grid).is_empty());
        assert!(b.grid.positions().all(|p| !b.grid.is_empty(p)));
    }

    #[test]
    fn palette_widens_then_caps() {
        assert_eq!(palette_size(1), 4);
        assert_eq!(palette_size(3), 6);
        assert_eq!(palette_size(10), 7);
    }

    #[test]
    fn level_up_preserves_score() {
        let mut b = SwapBoard::new(5);
        b.score = 999;
        // 9s at (7,0), (7,1), (7,3) and (6,2): no run until (6,2) is
        // swapped down to complete the 4-run.
        b.grid.set(Pos::new(7, 0), Cell::ordinary(Symbol(9)));
        b.grid.set(Pos::new(7, 1), Cell::ordinary(Symbol(9)));
        b.grid.set(Pos::new(7, 3), Cell::ordinary(Symbol(9)));
        b.grid.set(Pos::new(6, 2), Cell::ordinary(Symbol(9)));
        assert!(matcher::find_matches(&b.grid).is_empty());
        b.cursor = Pos::new(6, 2);
        b.select();
        b.cursor = Pos::new(7, 2);
        b.select();
        assert!(b.level >= 2);
        assert!(b.level_cleared);
        assert!(b.score >= 999 + 4 * POINTS_PER_CELL);
        assert!(matcher::find_matches(&b.grid).is_empty());
    }
}

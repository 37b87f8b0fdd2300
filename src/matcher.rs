//! Run detection: same-symbol rows/columns of length >= 3.
//!
//! One scanner serves all three boards; Empty never seeds a run and blocking
//! cells match like any other occupied cell.

use crate::grid::{Grid, Pos, Symbol};
use std::collections::HashSet;

pub const MIN_RUN: usize = 3;

/// A maximal same-symbol run along one row or column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// In scan order: left-to-right or top-to-bottom. `positions[0]` is the
    /// head the swap board may turn into a special symbol.
    pub positions: Vec<Pos>,
    pub symbol: Symbol,
}

impl Run {
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

/// All runs of length >= MIN_RUN, horizontal then vertical.
pub fn find_runs(grid: &Grid) -> Vec<Run> {
    let mut runs = Vec::new();
    for row in 0..grid.rows() {
        scan_line(grid, (0..grid.cols()).map(|col| Pos::new(row, col)), &mut runs);
    }
    for col in 0..grid.cols() {
        scan_line(grid, (0..grid.rows()).map(|row| Pos::new(row, col)), &mut runs);
    }
    runs
}

/// Deduplicated union of all run positions. Empty when the grid is stable.
pub fn find_matches(grid: &Grid) -> HashSet<Pos> {
    find_runs(grid)
        .into_iter()
        .flat_map(|r| r.positions)
        .collect()
}

fn scan_line(grid: &Grid, line: impl Iterator<Item = Pos>, runs: &mut Vec<Run>) {
    let mut current: Vec<Pos> = Vec::new();
    let mut current_symbol: Option<Symbol> = None;

    let mut flush = |current: &mut Vec<Pos>, symbol: Option<Symbol>, runs: &mut Vec<Run>| {
        if let Some(symbol) = symbol {
            if current.len() >= MIN_RUN {
                runs.push(Run {
                    positions: std::mem::take(current),
                    symbol,
                });
                return;
            }
        }
        current.clear();
    };

    for pos in line {
        let symbol = grid.get(pos).and_then(|c| c.symbol());
        match (symbol, current_symbol) {
            (Some(s), Some(cs)) if s == cs => current.push(pos),
            (Some(s), _) => {
                flush(&mut current, current_symbol, runs);
                current.push(pos);
                current_symbol = Some(s);
            }
            (None, _) => {
                flush(&mut current, current_symbol, runs);
                current_symbol = None;
            }
        }
    }
    flush(&mut current, current_symbol, runs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Grid, Pos, Symbol};

    fn grid_from_rows(rows: &[&str]) -> Grid {
        // '.' = empty, 'a'..'j' = symbols 0..9, 'A'..'J' = blocking 0..9
        let mut g = Grid::new(rows.len(), rows[0].len());
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    'a'..='j' => Cell::ordinary(Symbol(ch as u8 - b'a')),
                    'A'..='J' => Cell::blocking(Symbol(ch as u8 - b'A')),
                    _ => panic!("bad cell char {ch}"),
                };
                g.set(Pos::new(r, c), cell);
            }
        }
        g
    }

    #[test]
    fn empty_grid_has_no_matches() {
        let g = Grid::new(8, 8);
        assert!(find_matches(&g).is_empty());
    }

    #[test]
    fn two_in_a_row_is_not_a_run() {
        let g = grid_from_rows(&["aab", "bba", "aba"]);
        assert!(find_matches(&g).is_empty());
    }

    #[test]
    fn horizontal_run_of_three() {
        let g = grid_from_rows(&["aaab", "bbab", "abba", "babb"]);
        let m = find_matches(&g);
        assert_eq!(
            m,
            [Pos::new(0, 0), Pos::new(0, 1), Pos::new(0, 2)].into()
        );
    }

    #[test]
    fn vertical_run_head_is_topmost() {
        let g = grid_from_rows(&["ab", "ab", "ab", "ba"]);
        let runs = find_runs(&g);
        assert_eq!(runs.len(), 2);
        // Column 0: a,a,a with head at the top.
        assert_eq!(runs[0].positions[0], Pos::new(0, 0));
        assert_eq!(runs[0].len(), 3);
        assert_eq!(runs[1].symbol, Symbol(1));
    }

    #[test]
    fn run_spanning_the_whole_line_is_reported() {
        let g = grid_from_rows(&["aaaaa"]);
        let runs = find_runs(&g);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 5);
        assert_eq!(runs[0].positions[0], Pos::new(0, 0));
    }

    #[test]
    fn empty_cells_split_runs() {
        let g = grid_from_rows(&["aa.aa"]);
        assert!(find_matches(&g).is_empty());
    }

    #[test]
    fn cross_match_dedupes_shared_cell() {
        // Column 1 and row 1 both match on 'a'; (1,1) counted once.
        let g = grid_from_rows(&["bab", "aaa", "bab"]);
        let m = find_matches(&g);
        assert_eq!(m.len(), 5);
        assert!(m.contains(&Pos::new(1, 1)));
    }

    #[test]
    fn blocking_cells_participate_in_matches() {
        let g = grid_from_rows(&["aAa"]);
        let m = find_matches(&g);
        assert_eq!(m.len(), 3);
    }
}

//! Cascade resolution: clear -> (refill | gravity) -> re-check, to a fixed
//! point. One resolver drives both the refill-in-place swap board and the
//! gravity boards; the policy picks the behaviour.

use crate::grid::{Cell, Grid, Pos, Role, SpecialKind, Symbol};
use crate::matcher::{self, Run};
use crate::rng::Rng;
use std::collections::HashSet;

/// How matched cells leave the board and what a run is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Swap board: cleared cells are refilled in place with fresh symbols,
    /// no gravity. Long-run heads become special symbols instead of
    /// clearing (>=4 bomb, >=5 rainbow).
    RefillInPlace { points_per_cell: u32 },
    /// Capsule board: cleared cells go Empty, then non-blocking cells fall.
    GravityClear { points_per_cell: u32 },
}

impl ResolvePolicy {
    fn points_per_cell(self) -> u32 {
        match self {
            Self::RefillInPlace { points_per_cell } | Self::GravityClear { points_per_cell } => {
                points_per_cell
            }
        }
    }
}

/// One detect/clear/settle step of a cascade.
#[derive(Debug, Clone)]
pub struct CascadeStep {
    /// Every position that matched this step (for transient visual effects).
    pub matched: Vec<Pos>,
    pub score_delta: u32,
    /// Blocking cells removed this step (capsule win-condition bookkeeping).
    pub cleared_blocking: usize,
}

/// Full resolution result.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub score_delta: u32,
    pub steps: u32,
}

/// Run one step: detect runs, score them, clear/specialize/refill, settle.
/// Returns `None` when the grid is already stable.
pub fn step(grid: &mut Grid, policy: ResolvePolicy, palette_size: u8, rng: &mut Rng) -> Option<CascadeStep> {
    let runs = matcher::find_runs(grid);
    if runs.is_empty() {
        return None;
    }

    let mut score_delta = 0u32;
    let mut to_clear: HashSet<Pos> = HashSet::new();
    let mut special_heads: Vec<(Pos, Symbol, SpecialKind)> = Vec::new();

    for run in &runs {
        score_delta += run.len() as u32 * policy.points_per_cell();
        if let ResolvePolicy::RefillInPlace { .. } = policy {
            if let Some(kind) = special_for(run) {
                special_heads.push((run.positions[0], run.symbol, kind));
            }
        }
        to_clear.extend(run.positions.iter().copied());
    }
    // A head kept as a special symbol is not cleared; a cell that heads one
    // run but sits mid-run in a crossing one still survives as the special.
    for (pos, _, _) in &special_heads {
        to_clear.remove(pos);
    }

    let matched: Vec<Pos> = runs.iter().flat_map(|r| r.positions.iter().copied()).collect();
    let mut cleared_blocking = 0usize;
    for &pos in &to_clear {
        if grid.get(pos).is_some_and(|c| c.is_blocking()) {
            cleared_blocking += 1;
        }
        grid.set(pos, Cell::Empty);
    }
    for (pos, symbol, kind) in special_heads {
        grid.set(
            pos,
            Cell::Occupied {
                symbol,
                role: Role::Special(kind),
            },
        );
    }

    match policy {
        ResolvePolicy::RefillInPlace { .. } => grid.fill_random(palette_size, rng),
        ResolvePolicy::GravityClear { .. } => settle(grid),
    }

    let mut matched = matched;
    matched.sort_unstable();
    matched.dedup();
    Some(CascadeStep {
        matched,
        score_delta,
        cleared_blocking,
    })
}

/// Drive `step` to a fixed point. The step count is capped at the cell
/// count, so termination does not depend on what the refill draws.
pub fn resolve(grid: &mut Grid, policy: ResolvePolicy, palette_size: u8, rng: &mut Rng) -> Resolution {
    let max_steps = (grid.rows() * grid.cols()) as u32;
    let mut score_delta = 0u32;
    let mut steps = 0u32;
    while steps < max_steps {
        match step(grid, policy, palette_size, rng) {
            Some(s) => {
                score_delta += s.score_delta;
                steps += 1;
            }
            None => break,
        }
    }
    Resolution { score_delta, steps }
}

fn special_for(run: &Run) -> Option<SpecialKind> {
    match run.len() {
        0..=3 => None,
        4 => Some(SpecialKind::Bomb),
        _ => Some(SpecialKind::Rainbow),
    }
}

/// Column-wise gravity: every non-blocking occupied cell falls one row at a
/// time until nothing moves. Blocking cells stay put and support nothing
/// falling through them.
pub fn settle(grid: &mut Grid) {
    loop {
        let mut moved = false;
        for col in 0..grid.cols() {
            for row in (0..grid.rows().saturating_sub(1)).rev() {
                let here = Pos::new(row, col);
                let below = Pos::new(row + 1, col);
                let cell = match grid.get(here) {
                    Some(c) if c.falls() => c,
                    _ => continue,
                };
                if grid.is_empty(below) {
                    grid.set(here, Cell::Empty);
                    grid.set(below, cell);
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Grid, Pos, Role, Symbol};

    fn put_row(grid: &mut Grid, row: usize, cols: std::ops::Range<usize>, sym: u8) {
        for col in cols {
            grid.set(Pos::new(row, col), Cell::ordinary(Symbol(sym)));
        }
    }

    /// 8x8 board with no runs anywhere: alternating 2x2 checker of two symbols.
    fn stable_grid() -> Grid {
        let mut g = Grid::new(8, 8);
        for p in g.clone().positions() {
            let sym = ((p.row / 2 + p.col / 2) % 2) as u8;
            g.set(p, Cell::ordinary(Symbol(sym)));
        }
        g
    }

    #[test]
    fn stable_grid_resolves_to_zero_in_zero_steps() {
        let mut g = stable_grid();
        let before = g.clone();
        let mut rng = Rng::new(1);
        let r = resolve(&mut g, ResolvePolicy::GravityClear { points_per_cell: 100 }, 4, &mut rng);
        assert_eq!(r.score_delta, 0);
        assert_eq!(r.steps, 0);
        assert_eq!(g, before);
    }

    #[test]
    fn resolve_is_idempotent_on_stable_grids() {
        let mut g = stable_grid();
        let mut rng = Rng::new(1);
        let policy = ResolvePolicy::GravityClear { points_per_cell: 100 };
        resolve(&mut g, policy, 4, &mut rng);
        let first = g.clone();
        let r = resolve(&mut g, policy, 4, &mut rng);
        assert_eq!(r.score_delta, 0);
        assert_eq!(g, first);
    }

    #[test]
    fn refill_run_of_five_scores_100_and_crowns_rainbow_head() {
        // Horizontal run of 5 at row 2 cols 0-4, 20 points per cell.
        let mut g = stable_grid();
        put_row(&mut g, 2, 0..5, 9);
        let mut rng = Rng::new(7);
        let s = step(&mut g, ResolvePolicy::RefillInPlace { points_per_cell: 20 }, 4, &mut rng)
            .expect("run must match");
        assert_eq!(s.score_delta, 100);
        assert_eq!(
            g.get(Pos::new(2, 0)),
            Some(Cell::Occupied {
                symbol: Symbol(9),
                role: Role::Special(SpecialKind::Rainbow),
            })
        );
        // Cols 1-4 were refilled with fresh palette symbols, never left Empty.
        for col in 1..5 {
            let cell = g.get(Pos::new(2, col)).unwrap();
            assert!(matches!(cell, Cell::Occupied { role: Role::Ordinary, .. }));
        }
    }

    #[test]
    fn refill_run_of_four_crowns_bomb_head() {
        let mut g = stable_grid();
        put_row(&mut g, 5, 2..6, 8);
        let mut rng = Rng::new(2);
        let s = step(&mut g, ResolvePolicy::RefillInPlace { points_per_cell: 20 }, 4, &mut rng)
            .expect("run must match");
        assert_eq!(s.score_delta, 80);
        assert_eq!(
            g.get(Pos::new(5, 2)),
            Some(Cell::Occupied {
                symbol: Symbol(8),
                role: Role::Special(SpecialKind::Bomb),
            })
        );
    }

    #[test]
    fn refill_run_of_three_clears_the_head_too() {
        let mut g = stable_grid();
        put_row(&mut g, 0, 0..3, 9);
        let mut rng = Rng::new(3);
        let s = step(&mut g, ResolvePolicy::RefillInPlace { points_per_cell: 20 }, 4, &mut rng)
            .expect("run must match");
        assert_eq!(s.score_delta, 60);
        let cell = g.get(Pos::new(0, 0)).unwrap();
        assert!(matches!(cell, Cell::Occupied { role: Role::Ordinary, .. }));
    }

    #[test]
    fn gravity_pulls_cells_over_cleared_space() {
        let mut g = Grid::new(6, 6);
        g.set(Pos::new(0, 2), Cell::ordinary(Symbol(5)));
        put_row(&mut g, 5, 0..3, 1);
        let mut rng = Rng::new(4);
        let r = resolve(&mut g, ResolvePolicy::GravityClear { points_per_cell: 100 }, 4, &mut rng);
        assert_eq!(r.score_delta, 300);
        assert_eq!(r.steps, 1);
        // The lone cell fell all the way to the floor.
        assert_eq!(g.get(Pos::new(5, 2)), Some(Cell::ordinary(Symbol(5))));
        assert!(g.is_empty(Pos::new(0, 2)));
    }

    #[test]
    fn settled_grid_has_no_floating_cells() {
        let mut g = Grid::new(8, 8);
        let mut rng = Rng::new(11);
        for p in g.clone().positions() {
            if rng.below(3) == 0 {
                g.set(p, Cell::ordinary(Symbol(rng.below(4) as u8)));
            }
        }
        g.set(Pos::new(3, 3), Cell::blocking(Symbol(0)));
        settle(&mut g);
        for p in g.positions() {
            let below = Pos::new(p.row + 1, p.col);
            if g.get(p).is_some_and(|c| c.falls()) && g.in_bounds(below) {
                assert!(!g.is_empty(below), "floating cell above empty at {p:?}");
            }
        }
        // The blocking cell did not move.
        assert!(g.get(Pos::new(3, 3)).unwrap().is_blocking());
    }

    #[test]
    fn gravity_cascade_rechecks_after_falls() {
        // Clearing the bottom row drops a column of 'b' onto a row of 'b':
        // the second step must fire.
        let mut g = Grid::new(5, 5);
        put_row(&mut g, 4, 0..3, 1); // aaa on the floor -> clears first
        g.set(Pos::new(3, 0), Cell::ordinary(Symbol(2)));
        g.set(Pos::new(3, 1), Cell::ordinary(Symbol(2)));
        g.set(Pos::new(2, 2), Cell::ordinary(Symbol(2)));
        let mut rng = Rng::new(5);
        let r = resolve(&mut g, ResolvePolicy::GravityClear { points_per_cell: 100 }, 4, &mut rng);
        assert_eq!(r.steps, 2);
        assert_eq!(r.score_delta, 600);
        assert!(g.positions().all(|p| g.is_empty(p)));
    }

    #[test]
    fn cleared_blocking_cells_are_counted() {
        let mut g = Grid::new(5, 5);
        g.set(Pos::new(4, 0), Cell::blocking(Symbol(3)));
        g.set(Pos::new(4, 1), Cell::ordinary(Symbol(3)));
        g.set(Pos::new(4, 2), Cell::ordinary(Symbol(3)));
        let mut rng = Rng::new(6);
        let s = step(&mut g, ResolvePolicy::GravityClear { points_per_cell: 100 }, 4, &mut rng)
            .expect("run must match");
        assert_eq!(s.cleared_blocking, 1);
        assert_eq!(g.blocking_count(), 0);
    }
}

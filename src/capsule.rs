//! Capsule board: 8x16 falling two-cell capsules versus blocking targets.
//!
//! Phase machine: Spawning -> Falling -> Locking -> Resolving -> Spawning,
//! or GameOver when the spawn cells are occupied. The shell drives `tick`;
//! descent only happens in Falling, so a pending lock/resolve can never race
//! the gravity timer.

use crate::cascade::{self, ResolvePolicy};
use crate::grid::{Cell, Grid, Pos, Symbol};
use crate::piece::Capsule;
use crate::rng::Rng;
use crate::sfx::{Cue, Cues};

pub const ROWS: usize = 16;
pub const COLS: usize = 8;

/// Fixed capsule palette; progression changes target density, not colours.
pub const PALETTE: u8 = 3;

pub const POINTS_PER_CELL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Spawning,
    Falling,
    Locking,
    Resolving,
    GameOver,
}

#[derive(Debug)]
pub struct CapsuleBoard {
    pub grid: Grid,
    pub phase: Phase,
    pub capsule: Option<Capsule>,
    pub score: u32,
    pub level: u32,
    pub soft_drop: bool,
    /// Positions matched by the latest cascade step, for transient effects.
    pub last_matched: Vec<Pos>,
    pub cues: Cues,
    /// Set when the last blocking target was cleared; the shell advances
    /// the level and clears it.
    pub level_cleared: bool,
    rng: Rng,
}

impl CapsuleBoard {
    pub fn new(seed: u32) -> Self {
        let mut board = Self {
            grid: Grid::new(ROWS, COLS),
            phase: Phase::Spawning,
            capsule: None,
            score: 0,
            level: 1,
            soft_drop: false,
            last_matched: Vec::new(),
            cues: Cues::default(),
            level_cleared: false,
            rng: Rng::new(seed),
        };
        board.seed_targets();
        board
    }

    /// Advance to the next level: denser targets, score carried over.
    pub fn next_level(&mut self) {
        self.level += 1;
        self.level_cleared = false;
        self.grid = Grid::new(ROWS, COLS);
        self.capsule = None;
        self.phase = Phase::Spawning;
        self.soft_drop = false;
        self.last_matched.clear();
        self.seed_targets();
    }

    /// Scatter blocking targets over the bottom half, re-rolling any draw
    /// that would start the board with a ready-made run.
    fn seed_targets(&mut self) {
        let count = (2 + self.level * 2).min((ROWS / 2 * COLS) as u32 / 2);
        let mut placed = 0;
        let mut attempts = 0;
        while placed < count && attempts < 1000 {
            attempts += 1;
            let row = ROWS / 2 + self.rng.below((ROWS / 2) as u32) as usize;
            let col = self.rng.below(COLS as u32) as usize;
            let pos = Pos::new(row, col);
            if !self.grid.is_empty(pos) {
                continue;
            }
            let symbol = Symbol(self.rng.below(u32::from(PALETTE)) as u8);
            self.grid.set(pos, Cell::blocking(symbol));
            if !crate::matcher::find_matches(&self.grid).is_empty() {
                self.grid.set(pos, Cell::Empty);
                continue;
            }
            placed += 1;
        }
    }

    /// One logical tick. Each call advances the phase machine at most one
    /// transition, which is what lets the shell interleave animation delays
    /// between cascade steps without changing the outcome.
    pub fn tick(&mut self) {
        match self.phase {
            Phase::Spawning => self.spawn(),
            Phase::Falling => self.descend(),
            Phase::Locking => self.lock(),
            Phase::Resolving => self.resolve_step(),
            Phase::GameOver => {}
        }
    }

    /// Place a new capsule at the fixed spawn cells, or end the game when
    /// either is occupied.
    fn spawn(&mut self) {
        let spawn_a = Pos::new(0, COLS / 2 - 1);
        let spawn_b = Pos::new(0, COLS / 2);
        if !self.grid.is_empty(spawn_a) || !self.grid.is_empty(spawn_b) {
            self.phase = Phase::GameOver;
            self.cues.push(Cue::GameOver);
            return;
        }
        let a = Symbol(self.rng.below(u32::from(PALETTE)) as u8);
        let b = Symbol(self.rng.below(u32::from(PALETTE)) as u8);
        self.capsule = Some(Capsule::new(0, (COLS / 2 - 1) as i32, a, b));
        self.soft_drop = false;
        self.phase = Phase::Falling;
    }

    fn descend(&mut self) {
        let Some(capsule) = self.capsule.as_mut() else {
            self.phase = Phase::Spawning;
            return;
        };
        if capsule.can_move(&self.grid, 1, 0) {
            capsule.shift(1, 0);
        } else {
            self.phase = Phase::Locking;
        }
    }

    fn lock(&mut self) {
        if let Some(capsule) = self.capsule.take() {
            capsule.lock(&mut self.grid);
        }
        self.last_matched.clear();
        self.phase = Phase::Resolving;
    }

    /// One cascade step per tick so each clear/fall can be animated.
    fn resolve_step(&mut self) {
        let policy = ResolvePolicy::GravityClear {
            points_per_cell: POINTS_PER_CELL,
        };
        match cascade::step(&mut self.grid, policy, PALETTE, &mut self.rng) {
            Some(step) => {
                self.score += step.score_delta;
                self.last_matched = step.matched;
                self.cues.push(Cue::Match);
                if step.cleared_blocking > 0 && self.grid.blocking_count() == 0 {
                    self.level_cleared = true;
                    self.cues.push(Cue::Victory);
                }
            }
            None => {
                self.last_matched.clear();
                if self.level_cleared {
                    // Shell advances the level; stop spawning meanwhile.
                    return;
                }
                self.phase = Phase::Spawning;
            }
        }
    }

    pub fn move_left(&mut self) {
        self.move_capsule(0, -1);
    }

    pub fn move_right(&mut self) {
        self.move_capsule(0, 1);
    }

    fn move_capsule(&mut self, drow: i32, dcol: i32) {
        if self.phase != Phase::Falling {
            return;
        }
        if let Some(capsule) = self.capsule.as_mut() {
            if capsule.can_move(&self.grid, drow, dcol) {
                capsule.shift(drow, dcol);
            }
        }
    }

    pub fn rotate(&mut self) {
        if self.phase != Phase::Falling {
            return;
        }
        if let Some(capsule) = self.capsule.as_mut() {
            capsule.rotate(&self.grid);
        }
    }

    pub fn set_soft_drop(&mut self, on: bool) {
        if self.phase == Phase::Falling {
            self.soft_drop = on;
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

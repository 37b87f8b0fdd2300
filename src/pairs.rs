//! Pair board: layered tiles, selectability rules, pair matching.

use crate::grid::Symbol;
use crate::rng::Rng;
use crate::sfx::{Cue, Cues};

/// Tile footprint in board units (terminal cells).
pub const TILE_W: i32 = 4;
pub const TILE_H: i32 = 2;

pub const POINTS_PER_TILE: u32 = 100;

/// One tile. Placement is immutable after creation; only `visible` flips,
/// to false, when the tile is matched away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: u32,
    pub symbol: Symbol,
    pub x: i32,
    pub y: i32,
    pub layer: u8,
    pub visible: bool,
}

impl Tile {
    fn overlaps(&self, other: &Tile) -> bool {
        (self.x - other.x).abs() < TILE_W && (self.y - other.y).abs() < TILE_H
    }
}

/// A tile is selectable iff nothing visible covers it from a higher layer
/// and at least one lateral side is free on its own layer.
pub fn is_selectable(tile: &Tile, tiles: &[Tile]) -> bool {
    if !tile.visible {
        return false;
    }
    let covered = tiles.iter().any(|t| {
        t.visible && t.id != tile.id && t.layer > tile.layer && t.overlaps(tile)
    });
    if covered {
        return false;
    }
    let side_blocked = |left: bool| {
        tiles.iter().any(|t| {
            t.visible
                && t.id != tile.id
                && t.layer == tile.layer
                && (t.y - tile.y).abs() < TILE_H
                && if left {
                    tile.x - t.x > 0 && tile.x - t.x <= TILE_W
                } else {
                    t.x - tile.x > 0 && t.x - tile.x <= TILE_W
                }
        })
    };
    !(side_blocked(true) && side_blocked(false))
}

/// Per-layer grid sizes (cols, rows), bottom layer first.
fn layout(level: u32) -> &'static [(i32, i32)] {
    if level <= 1 {
        &[(6, 3), (4, 2), (2, 1)]
    } else {
        &[(8, 4), (6, 3), (4, 2)]
    }
}

#[derive(Debug)]
pub struct PairBoard {
    pub tiles: Vec<Tile>,
    /// Index into `tiles` of the tile under the cursor.
    pub cursor: usize,
    /// Id of the currently selected tile, if any.
    pub selected: Option<u32>,
    pub score: u32,
    pub level: u32,
    pub cues: Cues,
    pub board_cleared: bool,
}

impl PairBoard {
    pub fn new(seed: u32) -> Self {
        let mut board = Self {
            tiles: Vec::new(),
            cursor: 0,
            selected: None,
            score: 0,
            level: 1,
            cues: Cues::default(),
            board_cleared: false,
        };
        board.tiles = generate_tiles(board.level, &mut Rng::new(seed));
        board
    }

    pub fn next_level(&mut self, seed: u32) {
        self.level += 1;
        self.board_cleared = false;
        self.selected = None;
        self.cursor = 0;
        self.tiles = generate_tiles(self.level, &mut Rng::new(seed));
    }

    pub fn remaining(&self) -> usize {
        self.tiles.iter().filter(|t| t.visible).count()
    }

    /// Tap the tile under the cursor. Unselectable tiles are a no-op.
    pub fn tap(&mut self) {
        let Some(tile) = self.tiles.get(self.cursor) else {
            return;
        };
        if !is_selectable(tile, &self.tiles) {
            return;
        }
        let tapped_id = tile.id;
        let tapped_symbol = tile.symbol;
        match self.selected {
            None => self.selected = Some(tapped_id),
            Some(sel) if sel == tapped_id => self.selected = None,
            Some(sel) => {
                let sel_symbol = self
                    .tiles
                    .iter()
                    .find(|t| t.id == sel)
                    .map(|t| t.symbol);
                if sel_symbol == Some(tapped_symbol) {
                    for t in &mut self.tiles {
                        if t.id == sel || t.id == tapped_id {
                            t.visible = false;
                        }
                    }
                    self.score += 2 * POINTS_PER_TILE;
                    self.cues.push(Cue::Match);
                    self.selected = None;
                    if self.remaining() == 0 {
                        self.board_cleared = true;
                        self.cues.push(Cue::Victory);
                    }
                } else {
                    // Mismatch: the newly tapped tile becomes the sole
                    // selection, no penalty.
                    self.selected = Some(tapped_id);
                }
            }
        }
    }

    /// Move the cursor to the nearest visible tile in the given direction
    /// (dx/dy in board units, only the sign matters).
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let Some(current) = self.tiles.get(self.cursor) else {
            return;
        };
        let (cx, cy) = (current.x, current.y);
        let best = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(i, t)| *i != self.cursor && t.visible)
            .filter(|(_, t)| {
                if dx != 0 {
                    (t.x - cx).signum() == dx.signum()
                } else {
                    (t.y - cy).signum() == dy.signum()
                }
            })
            .min_by_key(|(_, t)| {
                let main = if dx != 0 { (t.x - cx).abs() } else { (t.y - cy).abs() };
                let cross = if dx != 0 { (t.y - cy).abs() } else { (t.x - cx).abs() };
                // Prefer tiles closest along the movement axis, then nearest
                // laterally, then topmost layer.
                (main * 16 + cross * 2, u8::MAX - t.layer)
            })
            .map(|(i, _)| i);
        if let Some(i) = best {
            self.cursor = i;
        }
    }

    /// True while at least one selectable same-symbol pair remains. A board
    /// with visible tiles but no such pair is a dead end.
    pub fn has_moves(&self) -> bool {
        let free: Vec<&Tile> = self
            .tiles
            .iter()
            .filter(|t| is_selectable(t, &self.tiles))
            .collect();
        free.iter().any(|a| {
            free.iter()
                .any(|b| b.id != a.id && b.symbol == a.symbol)
        })
    }

    /// Snap the cursor onto a visible tile after matches hide tiles.
    pub fn ensure_cursor_visible(&mut self) {
        if self.tiles.get(self.cursor).is_some_and(|t| t.visible) {
            return;
        }
        if let Some(i) = self.tiles.iter().position(|t| t.visible) {
            self.cursor = i;
        }
    }
}

/// Build the layered layout and deal symbols in shuffled pairs.
fn generate_tiles(level: u32, rng: &mut Rng) -> Vec<Tile> {
    let layers = layout(level);
    let palette = 8u8;

    let mut slots: Vec<(i32, i32, u8)> = Vec::new();
    for (layer, &(cols, rows)) in layers.iter().enumerate() {
        // Center each layer over the one below, offset half a tile so upper
        // tiles straddle lower ones.
        let (base_cols, base_rows) = layers[0];
        let x0 = (base_cols - cols) * TILE_W / 2 + layer as i32 * (TILE_W / 2);
        let y0 = (base_rows - rows) * TILE_H / 2 + layer as i32 * (TILE_H / 2);
        for r in 0..rows {
            for c in 0..cols {
                slots.push((x0 + c * TILE_W, y0 + r * TILE_H, layer as u8));
            }
        }
    }
    debug_assert!(slots.len() % 2 == 0, "layouts must pair up");

    let mut symbols: Vec<Symbol> = (0..slots.len() / 2)
        .flat_map(|i| {
            let s = Symbol((i % palette as usize) as u8);
            [s, s]
        })
        .collect();
    rng.shuffle(&mut symbols);

    slots
        .into_iter()
        .zip(symbols)
        .enumerate()
        .map(|(id, ((x, y, layer), symbol))| Tile {
            id: id as u32,
            symbol,
            x,
            y,
            layer,
            visible: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(id: u32, symbol: u8, x: i32, y: i32, layer: u8) -> Tile {
        Tile {
            id,
            symbol: Symbol(symbol),
            x,
            y,
            layer,
            visible: true,
        }
    }

    #[test]
    fn lone_tile_is_selectable() {
        let tiles = vec![tile(0, 1, 0, 0, 0)];
        assert!(is_selectable(&tiles[0], &tiles));
    }

    #[test]
    fn covered_tile_is_not_selectable() {
        let tiles = vec![tile(0, 1, 0, 0, 0), tile(1, 2, 2, 1, 1)];
        assert!(!is_selectable(&tiles[0], &tiles));
        assert!(is_selectable(&tiles[1], &tiles));
    }

    #[test]
    fn tile_blocked_on_both_sides_is_not_selectable() {
        let tiles = vec![
            tile(0, 1, 0, 0, 0),
            tile(1, 2, TILE_W, 0, 0),
            tile(2, 3, 2 * TILE_W, 0, 0),
        ];
        assert!(is_selectable(&tiles[0], &tiles));
        assert!(!is_selectable(&tiles[1], &tiles));
        assert!(is_selectable(&tiles[2], &tiles));
    }

    #[test]
    fn hiding_a_neighbour_frees_the_middle_tile() {
        let mut tiles = vec![
            tile(0, 1, 0, 0, 0),
            tile(1, 2, TILE_W, 0, 0),
            tile(2, 3, 2 * TILE_W, 0, 0),
        ];
        tiles[0].visible = false;
        assert!(is_selectable(&tiles[1], &tiles));
    }

    #[test]
    fn different_rows_do_not_block() {
        let tiles = vec![
            tile(0, 1, 0, 0, 0),
            tile(1, 2, TILE_W, TILE_H, 0),
            tile(2, 3, 2 * TILE_W, 0, 0),
        ];
        // Tile 1 sits on another row band; tiles 0 and 2 don't flank it.
        assert!(is_selectable(&tiles[1], &tiles));
    }

    #[test]
    fn generated_board_has_even_pairable_tiles() {
        let mut rng = Rng::new(1);
        for level in 1..=3 {
            let tiles = generate_tiles(level, &mut rng);
            assert!(tiles.len() % 2 == 0);
            let mut counts = std::collections::HashMap::new();
            for t in &tiles {
                *counts.entry(t.symbol).or_insert(0u32) += 1;
            }
            assert!(counts.values().all(|&c| c % 2 == 0), "symbols must pair");
        }
    }

    #[test]
    fn matching_pair_hides_both_and_scores() {
        let mut b = PairBoard::new(1);
        b.tiles = vec![tile(0, 5, 0, 0, 0), tile(1, 5, 2 * TILE_W, 0, 0)];
        b.cursor = 0;
        b.tap();
        assert_eq!(b.selected, Some(0));
        b.cursor = 1;
        b.tap();
        assert_eq!(b.score, 2 * POINTS_PER_TILE);
        assert_eq!(b.remaining(), 0);
        assert!(b.board_cleared, "last pair clears the board");
        let cues = b.cues.drain();
        assert!(cues.contains(&Cue::Match));
        assert!(cues.contains(&Cue::Victory));
    }

    #[test]
    fn mismatch_reselects_the_new_tile() {
        let mut b = PairBoard::new(1);
        b.tiles = vec![tile(0, 5, 0, 0, 0), tile(1, 6, 2 * TILE_W, 0, 0)];
        b.cursor = 0;
        b.tap();
        b.cursor = 1;
        b.tap();
        assert_eq!(b.selected, Some(1));
        assert_eq!(b.remaining(), 2);
        assert_eq!(b.score, 0);
    }

    #[test]
    fn tapping_selected_tile_deselects() {
        let mut b = PairBoard::new(1);
        b.tiles = vec![tile(0, 5, 0, 0, 0)];
        b.cursor = 0;
        b.tap();
        b.tap();
        assert_eq!(b.selected, None);
    }

    #[test]
    fn tapping_blocked_tile_is_a_noop() {
        let mut b = PairBoard::new(1);
        b.tiles = vec![tile(0, 5, 0, 0, 0), tile(1, 5, 2, 1, 1)];
        b.cursor = 0;
        b.tap();
        assert_eq!(b.selected, None);
    }

    #[test]
    fn fresh_board_has_a_selectable_tile() {
        let b = PairBoard::new(9);
        assert!(b.tiles.iter().any(|t| is_selectable(t, &b.tiles)));
    }
}

//! Layout and drawing: menu, the three boards, sidebar, game over, scores.

use crate::app::{App, Board, Screen};
use crate::grid::{Cell, Grid, Pos, Role, SpecialKind};
use crate::pairs::{self, Tile};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count,
};

/// Grid cells render two terminal columns wide, one row tall.
const CELL_W: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;
/// Duration of the match-clear fade (TachyonFX) in ms.
const MATCH_FADE_MS: u32 = 350;

pub fn draw(frame: &mut Frame, app: &mut App, now: Instant) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(app.theme.bg))
        .render(area, frame.buffer_mut());
    match app.screen {
        Screen::Menu => draw_menu(frame, app, area),
        Screen::Playing => draw_game(frame, app, area, now),
        Screen::GameOver => draw_game_over(frame, app, area),
        Screen::Scores => draw_scores(frame, app, area),
    }
}

/// Centered rect of the given size, clamped to the area.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

/// Board outer rect (with border), shifted left to leave sidebar room.
fn board_outer_rect(area: Rect, board: &Board) -> Rect {
    let (inner_w, inner_h) = match board {
        Board::Swap(b) => (b.grid.cols() as u16 * CELL_W, b.grid.rows() as u16),
        Board::Capsule(b) => (b.grid.cols() as u16 * CELL_W, b.grid.rows() as u16),
        Board::Pairs(b) => pairs_extent(&b.tiles),
    };
    let (w, h) = (inner_w + 2, inner_h + 2);
    let total_w = w + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

/// Bounding box of all tiles, visible or not, so the board doesn't shift
/// around as pairs disappear.
fn pairs_extent(tiles: &[Tile]) -> (u16, u16) {
    let w = tiles.iter().map(|t| t.x + pairs::TILE_W).max().unwrap_or(0);
    let h = tiles.iter().map(|t| t.y + pairs::TILE_H).max().unwrap_or(0);
    (w.max(0) as u16, h.max(0) as u16)
}

fn draw_game(frame: &mut Frame, app: &mut App, area: Rect, now: Instant) {
    let Some(board) = app.board.as_ref() else {
        return;
    };
    let outer = board_outer_rect(area, board);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.div_line).bg(app.theme.bg))
        .title(Span::styled(
            format!(" {} ", board.kind().title()),
            Style::default().fg(app.theme.title),
        ));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    match board {
        Board::Swap(b) => {
            draw_cell_grid(frame, &b.grid, inner, &app.theme);
            draw_grid_cursor(frame, inner, b.cursor, b.selected, &app.theme);
        }
        Board::Capsule(b) => {
            draw_cell_grid(frame, &b.grid, inner, &app.theme);
            if let Some(capsule) = &b.capsule {
                let buf = frame.buffer_mut();
                for (r, c, symbol) in capsule.cells() {
                    if r < 0 || c < 0 {
                        continue;
                    }
                    let x = inner.x + c as u16 * CELL_W;
                    let y = inner.y + r as u16;
                    if x + 1 < inner.x + inner.width && y < inner.y + inner.height {
                        // Falling halves are hatched so they read as "not
                        // locked yet".
                        let style = Style::default()
                            .fg(app.theme.symbol_color(symbol.0))
                            .bg(app.theme.bg);
                        buf.set_string(x, y, "▓▓", style);
                    }
                }
            }
        }
        Board::Pairs(b) => draw_pair_tiles(frame, b, inner, &app.theme),
    }

    draw_sidebar(frame, app, outer, area);

    if !app.no_animation() {
        apply_match_effect(frame, app, inner, now);
    }

    if app.paused {
        let popup = centered(area, 32, 3);
        Paragraph::new(Line::from(Span::styled(
            "Paused — P resumes, Q quits",
            Style::default().fg(app.theme.title),
        )))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.div_line).bg(app.theme.bg))
                .style(Style::default().bg(app.theme.bg)),
        )
        .render(popup, frame.buffer_mut());
    }
}

/// Paint an occupied/empty cell grid (swap and capsule boards).
fn draw_cell_grid(frame: &mut Frame, grid: &Grid, inner: Rect, theme: &Theme) {
    let buf = frame.buffer_mut();
    for pos in grid.positions() {
        let x = inner.x + pos.col as u16 * CELL_W;
        let y = inner.y + pos.row as u16;
        if x + 1 >= inner.x + inner.width || y >= inner.y + inner.height {
            continue;
        }
        let (text, style) = match grid.get(pos) {
            Some(Cell::Occupied { symbol, role }) => {
                let color = theme.symbol_color(symbol.0);
                match role {
                    Role::Ordinary => ("  ", Style::default().bg(color)),
                    Role::Special(SpecialKind::Bomb) => {
                        ("◉ ", Style::default().fg(theme.bg).bg(color))
                    }
                    Role::Special(SpecialKind::Rainbow) => (
                        "✦ ",
                        Style::default()
                            .fg(theme.bg)
                            .bg(color)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Role::Blocking => ("▒▒", Style::default().fg(color).bg(theme.bg)),
                }
            }
            _ => ("  ", Style::default().bg(theme.bg)),
        };
        buf.set_string(x, y, text, style);
    }
}

/// Cursor brackets and selection marker for the swap board.
fn draw_grid_cursor(
    frame: &mut Frame,
    inner: Rect,
    cursor: Pos,
    selected: Option<Pos>,
    theme: &Theme,
) {
    let buf = frame.buffer_mut();
    let mut mark = |pos: Pos, left: &str, right: &str| {
        let x = inner.x + pos.col as u16 * CELL_W;
        let y = inner.y + pos.row as u16;
        if x + 1 >= inner.x + inner.width || y >= inner.y + inner.height {
            return;
        }
        let style = Style::default()
            .fg(theme.main_fg)
            .add_modifier(Modifier::BOLD);
        let left_bg = buf[(x, y)].style().bg.unwrap_or(theme.bg);
        buf[(x, y)].set_symbol(left).set_style(style.bg(left_bg));
        let right_bg = buf[(x + 1, y)].style().bg.unwrap_or(theme.bg);
        buf[(x + 1, y)].set_symbol(right).set_style(style.bg(right_bg));
    };
    if let Some(sel) = selected {
        mark(sel, "(", ")");
    }
    mark(cursor, "[", "]");
}

/// Tiles drawn bottom layer first so upper layers cover them.
fn draw_pair_tiles(frame: &mut Frame, board: &pairs::PairBoard, inner: Rect, theme: &Theme) {
    let mut order: Vec<usize> = (0..board.tiles.len()).collect();
    order.sort_by_key(|&i| board.tiles[i].layer);
    let cursor_id = board.tiles.get(board.cursor).map(|t| t.id);
    let buf = frame.buffer_mut();
    for i in order {
        let tile = &board.tiles[i];
        if !tile.visible {
            continue;
        }
        let selectable = pairs::is_selectable(tile, &board.tiles);
        let color = theme.symbol_color(tile.symbol.0);
        let mut style = if selectable {
            Style::default().fg(theme.bg).bg(color)
        } else {
            Style::default().fg(theme.inactive_fg).bg(theme.div_line)
        };
        if board.selected == Some(tile.id) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let face = (b'A' + tile.symbol.0) as char;
        for dy in 0..pairs::TILE_H {
            let tx = inner.x as i32 + tile.x;
            let ty = inner.y as i32 + tile.y + dy;
            if tx < 0 || ty < 0 {
                continue;
            }
            let (x, y) = (tx as u16, ty as u16);
            if x + pairs::TILE_W as u16 > inner.x + inner.width || y >= inner.y + inner.height {
                continue;
            }
            let text = if dy == 0 {
                format!(" {face}  ")
            } else {
                "    ".to_string()
            };
            buf.set_string(x, y, text, style);
            if cursor_id == Some(tile.id) {
                let cursor_style = Style::default()
                    .fg(theme.title)
                    .bg(style.bg.unwrap_or(theme.bg))
                    .add_modifier(Modifier::BOLD);
                buf[(x, y)].set_symbol("▐").set_style(cursor_style);
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, app: &App, board_outer: Rect, area: Rect) {
    let Some(board) = app.board.as_ref() else {
        return;
    };
    let x = board_outer.x + board_outer.width + 1;
    let sidebar = Rect {
        x,
        y: board_outer.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(x.saturating_sub(area.x))),
        height: area.height.saturating_sub(board_outer.y - area.y),
    };
    if sidebar.width == 0 || sidebar.height == 0 {
        return;
    }

    let label = Style::default().fg(app.theme.inactive_fg);
    let value = Style::default()
        .fg(app.theme.main_fg)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Score   ", label),
            Span::styled(board.score().to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Level   ", label),
            Span::styled(board.level().to_string(), value),
        ]),
    ];
    match board {
        Board::Swap(_) => {}
        Board::Capsule(b) => lines.push(Line::from(vec![
            Span::styled("Targets ", label),
            Span::styled(b.grid.blocking_count().to_string(), value),
        ])),
        Board::Pairs(b) => lines.push(Line::from(vec![
            Span::styled("Tiles   ", label),
            Span::styled(b.remaining().to_string(), value),
        ])),
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Top scores",
        Style::default().fg(app.theme.title),
    )));
    if app.top_scores.is_empty() {
        lines.push(Line::from(Span::styled("(none yet)", label)));
    }
    for entry in app.top_scores.iter().take(5) {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<9}", entry.name), label),
            Span::styled(entry.score.to_string(), value),
        ]));
    }
    lines.push(Line::default());
    for help in controls_help(board) {
        lines.push(Line::from(Span::styled(*help, label)));
    }
    if let Some((msg, _)) = &app.flash {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            msg.clone(),
            Style::default()
                .fg(app.theme.title)
                .add_modifier(Modifier::BOLD),
        )));
    }
    Paragraph::new(lines).render(sidebar, frame.buffer_mut());

    // Level progress gauge under the swap board's stats.
    if let Board::Swap(b) = board {
        let gauge_area = Rect {
            x: sidebar.x,
            y: board_outer.y + board_outer.height.saturating_sub(1),
            width: sidebar.width.saturating_sub(2),
            height: 1,
        };
        if gauge_area.bottom() <= area.bottom() && gauge_area.width > 0 {
            Gauge::default()
                .gauge_style(Style::default().fg(app.theme.title).bg(app.theme.div_line))
                .ratio(b.level_progress().clamp(0.0, 1.0))
                .label("")
                .render(gauge_area, frame.buffer_mut());
        }
    }
}

fn controls_help(board: &Board) -> &'static [&'static str] {
    match board {
        Board::Swap(_) => &["Arrows move cursor", "Enter picks / swaps", "P pause  Q quit"],
        Board::Capsule(_) => &["Arrows steer", "Up rotates, Down drops", "P pause  Q quit"],
        Board::Pairs(_) => &["Arrows hop tiles", "Enter taps", "P pause  Q quit"],
    }
}

/// Build the match-clear fade when a fresh match landed, then advance it.
fn apply_match_effect(frame: &mut Frame, app: &mut App, inner: Rect, now: Instant) {
    let matched: Vec<(u16, u16)> = match app.board.as_ref() {
        Some(Board::Swap(b)) => cell_buffer_positions(inner, &b.last_matched),
        Some(Board::Capsule(b)) => cell_buffer_positions(inner, &b.last_matched),
        _ => return,
    };
    if app.pending_effect && !matched.is_empty() {
        app.pending_effect = false;
        let set: HashSet<(u16, u16)> = matched.into_iter().collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            set.contains(&(pos.x, pos.y))
        }));
        let bg = app.theme.bg;
        let effect = fx::fade_to(bg, bg, (MATCH_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        app.match_effect = Some(effect);
        app.match_effect_time = None;
    }
    if let Some(effect) = app.match_effect.as_mut() {
        let delta = app
            .match_effect_time
            .map_or(std::time::Duration::ZERO, |t| {
                now.saturating_duration_since(t)
            });
        app.match_effect_time = Some(now);
        let tfx_delta =
            TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
        frame.render_effect(effect, inner, tfx_delta);
    }
}

/// Buffer (x, y) positions covered by the given grid cells.
fn cell_buffer_positions(inner: Rect, cells: &[Pos]) -> Vec<(u16, u16)> {
    let mut out = Vec::new();
    for pos in cells {
        let x0 = inner.x + pos.col as u16 * CELL_W;
        let y = inner.y + pos.row as u16;
        if y >= inner.y + inner.height {
            continue;
        }
        for x in x0..(x0 + CELL_W).min(inner.x + inner.width) {
            out.push((x, y));
        }
    }
    out
}

fn draw_menu(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered(area, 44, 12);
    let title_style = Style::default()
        .fg(app.theme.title)
        .add_modifier(Modifier::BOLD);
    let label = Style::default().fg(app.theme.inactive_fg);
    let mut lines = vec![
        Line::from(Span::styled("T R I P T U I", title_style)),
        Line::from(Span::styled("three small puzzles, one terminal", label)),
        Line::default(),
    ];
    for kind in crate::GameKind::ALL {
        let selected = kind == app.menu_selected;
        let style = if selected {
            Style::default()
                .fg(app.theme.main_fg)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(app.theme.main_fg)
        };
        let marker = if selected { "▶ " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{marker}{:<14}", kind.title()),
            style,
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Arrows choose · Enter starts · Q quits",
        label,
    )));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.div_line).bg(app.theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered(area, 40, 9);
    let title_style = Style::default()
        .fg(app.theme.title)
        .add_modifier(Modifier::BOLD);
    let label = Style::default().fg(app.theme.inactive_fg);
    let value = Style::default()
        .fg(app.theme.main_fg)
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("GAME OVER", title_style)),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{} — final score ", app.final_game.title()), label),
            Span::styled(app.final_score.to_string(), value),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled("Name: ", label),
            Span::styled(format!("{}_", app.name_input), value),
        ]),
        Line::from(Span::styled("Enter saves · Esc skips", label)),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.div_line).bg(app.theme.bg))
                .title(Span::styled(" triptui ", title_style)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_scores(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered(area, 36, (app.top_scores.len() as u16 + 6).max(8));
    let title_style = Style::default()
        .fg(app.theme.title)
        .add_modifier(Modifier::BOLD);
    let label = Style::default().fg(app.theme.inactive_fg);
    let value = Style::default().fg(app.theme.main_fg);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} — top scores", app.final_game.title()),
            title_style,
        )),
        Line::default(),
    ];
    if app.top_scores.is_empty() {
        lines.push(Line::from(Span::styled("no scores yet", label)));
    }
    for (i, entry) in app.top_scores.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>2}. ", i + 1), label),
            Span::styled(format!("{:<12}", entry.name), value),
            Span::styled(entry.score.to_string(), value),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Enter or Q returns to menu", label)));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.div_line).bg(app.theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

//! Key bindings: normal and vim-style. Each board interprets the directional
//! actions its own way (capsule: Up rotates, Down soft-drops).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Enter / Space: pick a cell, tap a tile, confirm a menu item.
    Select,
    Pause,
    Quit,
    None,
}

/// Map key event to action. Supports both normal (arrows, enter/space) and
/// vim (hjkl) bindings.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('p') | KeyCode::Char(' ') if modifiers == KeyModifiers::CONTROL => {
            Action::Pause
        }
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::Left,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::Right,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::Up,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') if no_mod => Action::Select,
        _ => Action::None,
    }
}

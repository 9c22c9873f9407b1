//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char('m') => app.toggle_hourly_mode(),
        KeyCode::Tab => app.next_group(),
        KeyCode::BackTab => app.prev_group(),
        _ => {}
    }
}

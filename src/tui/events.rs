//! Event handling for the TUI
//!
//! Translates terminal events into messages for [`App::dispatch`].

use crossterm::event::{KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

use super::app::App;
use super::msg::{key_to_msg, Msg};

/// Handle a key event. Returns true if the app should quit.
pub fn handle_event(app: &mut App, key: KeyEvent) -> bool {
    // Windows reports both press and release
    if key.kind == KeyEventKind::Release {
        return false;
    }
    let msg = key_to_msg(key.code, key.modifiers, app.model.help_open);
    app.dispatch(msg)
}

/// Mouse wheel scrolls whichever panel has focus
pub fn handle_mouse(app: &mut App, event: MouseEvent) {
    let msg = match event.kind {
        MouseEventKind::ScrollDown => Msg::MoveDown,
        MouseEventKind::ScrollUp => Msg::MoveUp,
        _ => return,
    };
    app.dispatch(msg);
}

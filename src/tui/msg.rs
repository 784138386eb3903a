//! TEA Message Types for the TUI
//!
//! Every user action and outside event is a [`Msg`]. Messages describe what
//! happened; [`super::update::update`] decides what it means.

use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // === Navigation ===
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    JumpToTop,
    JumpToBottom,

    // === Filter picker ===
    /// Move to the next filter field
    NextFilter,
    /// Move to the previous filter field
    PrevFilter,
    /// Flip the option under the cursor
    ToggleOption,
    /// Select every option of the current field
    SelectAllOptions,
    /// Deselect every option of the current field
    ClearOptions,
    /// Restore every field to all options selected
    ResetFilters,

    // === Panels ===
    /// Cycle focus between filter picker and preview (Tab)
    NextPanel,
    /// Cycle focus backwards (Shift+Tab)
    PrevPanel,

    // === Modals ===
    ToggleHelp,
    CloseModal,

    // === Data ===
    /// Re-check the raw file on request
    Reload,
    /// The watcher saw the raw file change
    RawChanged,

    // === Lifecycle ===
    Quit,
    Tick,
    Resize(u16, u16),
    Noop,
}

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Filters,
    Preview,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Filters => Focus::Preview,
            Focus::Preview => Focus::Filters,
        }
    }

    pub fn prev(self) -> Self {
        // Two panels, so backwards is the same as forwards
        self.next()
    }
}

/// Convert a key event to a message
pub fn key_to_msg(code: KeyCode, modifiers: KeyModifiers, help_open: bool) -> Msg {
    if help_open {
        return match code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Msg::CloseModal,
            _ => Msg::Noop,
        };
    }

    match code {
        KeyCode::Char('q') => Msg::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Msg::Quit,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => Msg::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Msg::MoveUp,
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => Msg::PageDown,
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => Msg::PageUp,
        KeyCode::PageDown => Msg::PageDown,
        KeyCode::PageUp => Msg::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Msg::JumpToTop,
        KeyCode::Char('G') | KeyCode::End => Msg::JumpToBottom,

        // Filters
        KeyCode::Char('l') | KeyCode::Right => Msg::NextFilter,
        KeyCode::Char('h') | KeyCode::Left => Msg::PrevFilter,
        KeyCode::Char(' ') | KeyCode::Enter => Msg::ToggleOption,
        KeyCode::Char('a') => Msg::SelectAllOptions,
        KeyCode::Char('n') => Msg::ClearOptions,
        KeyCode::Char('r') => Msg::ResetFilters,

        // Panels
        KeyCode::Tab => Msg::NextPanel,
        KeyCode::BackTab => Msg::PrevPanel,

        KeyCode::Char('?') => Msg::ToggleHelp,
        KeyCode::Char('R') => Msg::Reload,

        _ => Msg::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_msg(KeyCode::Char('q'), KeyModifiers::NONE, false), Msg::Quit);
        assert_eq!(key_to_msg(KeyCode::Char('c'), KeyModifiers::CONTROL, false), Msg::Quit);
    }

    #[test]
    fn test_filter_keys() {
        assert_eq!(key_to_msg(KeyCode::Char(' '), KeyModifiers::NONE, false), Msg::ToggleOption);
        assert_eq!(key_to_msg(KeyCode::Right, KeyModifiers::NONE, false), Msg::NextFilter);
        assert_eq!(key_to_msg(KeyCode::Char('r'), KeyModifiers::NONE, false), Msg::ResetFilters);
        assert_eq!(key_to_msg(KeyCode::Char('R'), KeyModifiers::SHIFT, false), Msg::Reload);
    }

    #[test]
    fn test_help_swallows_keys() {
        assert_eq!(key_to_msg(KeyCode::Char('r'), KeyModifiers::NONE, true), Msg::Noop);
        assert_eq!(key_to_msg(KeyCode::Esc, KeyModifiers::NONE, true), Msg::CloseModal);
        // q closes help rather than quitting
        assert_eq!(key_to_msg(KeyCode::Char('q'), KeyModifiers::NONE, true), Msg::CloseModal);
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(Focus::Filters.next(), Focus::Preview);
        assert_eq!(Focus::Preview.next(), Focus::Filters);
        assert_eq!(Focus::Filters.prev(), Focus::Preview);
    }
}

//! Pure state transformations for the TUI (Functional Core)
//!
//! No I/O here. The imperative shell (app.rs, events.rs) calls these.

use crate::filters::Filter;

// =============================================================================
// Navigation - Pure index calculations
// =============================================================================

/// Calculate new selected index after moving up
pub fn move_selection_up(current: usize) -> usize {
    current.saturating_sub(1)
}

/// Calculate new selected index after moving down
pub fn move_selection_down(current: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        (current + 1).min(max - 1)
    }
}

/// Calculate new selected index after page down
pub fn page_down(current: usize, page_size: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        (current + page_size).min(max - 1)
    }
}

/// Calculate new selected index after page up
pub fn page_up(current: usize, page_size: usize) -> usize {
    current.saturating_sub(page_size)
}

/// Calculate scroll offset to keep selection visible
pub fn calculate_scroll_offset(selected: usize, current_offset: usize, visible_items: usize) -> usize {
    if visible_items == 0 {
        return 0;
    }
    if selected < current_offset {
        selected
    } else if selected >= current_offset + visible_items {
        selected.saturating_sub(visible_items - 1)
    } else {
        current_offset
    }
}

/// Clamp selection index to valid range
pub fn clamp_selection(selected: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        selected.min(max - 1)
    }
}

/// Step through `len` items with wraparound
pub fn cycle_index(current: usize, len: usize, forward: bool) -> usize {
    match (len, forward) {
        (0, _) => 0,
        (_, true) => (current + 1) % len,
        (_, false) => (current + len - 1) % len,
    }
}

// =============================================================================
// Display helpers
// =============================================================================

pub fn checkbox(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

/// "Topic (3/12)", or "Topic (all)" when nothing is filtered out
pub fn filter_summary(filter: &Filter) -> String {
    if filter.is_all_selected() {
        format!("{} (all)", filter.field.label())
    } else {
        let selected = filter.options.iter().filter(|o| filter.is_selected(o)).count();
        format!("{} ({}/{})", filter.field.label(), selected, filter.options.len())
    }
}

/// Shorten to `max_len` characters with a trailing ellipsis
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Format an optional number, "n/a" when undefined
pub fn format_optional(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", places, v),
        None => "n/a".to_string(),
    }
}

//! Filter picker widget with multi-select checkboxes
//!
//! Lists every filter field; the current one is expanded to show its options.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem},
};

use crate::filters::FilterState;
use crate::tui::msg::Focus;
use crate::tui::state::{calculate_scroll_offset, checkbox, filter_summary, truncate_str};
use crate::tui::update::Model;

pub fn draw(frame: &mut Frame, filters: &FilterState, model: &Model, area: Rect) {
    let focused = model.focus == Focus::Filters;
    let block = Block::default()
        .title(format!(" Filters (reset #{}) ", filters.generation()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::Blue }));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let fields = filters.filters();
    if fields.is_empty() {
        let empty = ratatui::widgets::Paragraph::new("No filterable columns")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner_area);
        return;
    }

    let width = inner_area.width.saturating_sub(6) as usize;
    // Rows left for options after one line per field
    let option_rows = (inner_area.height as usize).saturating_sub(fields.len()).max(1);

    let mut items: Vec<ListItem> = Vec::new();
    for (idx, filter) in fields.iter().enumerate() {
        let is_current = idx == model.filter_index;
        let marker = if is_current { "▾ " } else { "▸ " };
        let header_style = if is_current {
            Style::default().fg(Color::Yellow).bold()
        } else if filter.is_all_selected() {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Magenta)
        };
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{}{}", marker, filter_summary(filter)),
            header_style,
        ))));

        if !is_current {
            continue;
        }

        let offset = calculate_scroll_offset(model.option_index, 0, option_rows);
        for (opt_idx, option) in filter.options.iter().enumerate().skip(offset).take(option_rows) {
            let is_selected = filter.is_selected(option);
            let is_cursor = focused && opt_idx == model.option_index;

            let style = if is_cursor {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else if is_selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };

            items.push(ListItem::new(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    checkbox(is_selected),
                    if is_selected {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    },
                ),
                Span::raw(" "),
                Span::styled(truncate_str(option, width), style),
            ])));
        }
    }

    frame.render_widget(List::new(items), inner_area);
}

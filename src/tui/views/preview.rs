//! Preview view - scrollable table of the first filtered rows

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::dashboard::Preview;
use crate::tui::state::truncate_str;

const COLUMN_WIDTH: u16 = 12;

pub fn draw(frame: &mut Frame, preview: &Preview, offset: usize, focused: bool, area: Rect) {
    let title = format!(
        " Preview ({}-{} of {} shown, {} matching) ",
        (offset + 1).min(preview.rows.len()),
        (offset + area.height.saturating_sub(3) as usize).min(preview.rows.len()),
        preview.rows.len(),
        preview.total_rows
    );
    let border = if focused { Color::Cyan } else { Color::Blue };

    let header = Row::new(
        preview
            .headers
            .iter()
            .map(|h| Cell::from(truncate_str(h, COLUMN_WIDTH as usize)).style(Style::default().bold())),
    )
    .style(Style::default().fg(Color::Yellow));

    let rows = preview.rows.iter().skip(offset).map(|row| {
        Row::new(
            row.iter()
                .map(|c| Cell::from(truncate_str(&c.to_string(), COLUMN_WIDTH as usize))),
        )
    });

    let widths = vec![Constraint::Length(COLUMN_WIDTH); preview.headers.len()];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(table, area);
}

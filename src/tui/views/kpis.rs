//! KPI row - headline numbers for the current selection

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::metrics::Kpis;
use crate::tui::state::format_optional;

/// (label, value) pairs in display order
pub fn kpi_cells(kpis: &Kpis) -> Vec<(&'static str, String)> {
    vec![
        ("Students", kpis.students.to_string()),
        ("Mean engagement", format_optional(kpis.mean_engagement, 2)),
        ("Median engagement", format_optional(kpis.median_engagement, 2)),
        ("Top topic", kpis.most_common_topic.clone().unwrap_or_else(|| "n/a".to_string())),
        ("Top class", kpis.most_common_class.clone().unwrap_or_else(|| "n/a".to_string())),
        ("Engagement vs class r", format_optional(kpis.engagement_class_corr, 3)),
        (
            "Absent 7+ days",
            kpis.absence_above_7_share
                .map_or("n/a".to_string(), |s| format!("{:.1}%", s * 100.0)),
        ),
    ]
}

pub fn draw(frame: &mut Frame, kpis: &Kpis, area: Rect) {
    let cells = kpi_cells(kpis);
    let constraints = vec![Constraint::Ratio(1, cells.len() as u32); cells.len()];
    let areas = Layout::horizontal(constraints).split(area);

    for ((label, value), cell) in cells.into_iter().zip(areas.iter()) {
        let widget = Paragraph::new(Line::from(Span::styled(value, Style::default().fg(Color::White).bold())))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(format!(" {} ", label))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        frame.render_widget(widget, *cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_cells_format_undefined_values() {
        let kpis = Kpis {
            students: 12,
            mean_engagement: Some(41.5),
            median_engagement: None,
            engagement_class_corr: None,
            most_common_topic: Some("IT".to_string()),
            most_common_class: Some("M".to_string()),
            absence_above_7_share: Some(0.25),
        };
        let cells = kpi_cells(&kpis);
        assert_eq!(cells[0], ("Students", "12".to_string()));
        assert_eq!(cells[1].1, "41.50");
        assert_eq!(cells[2].1, "n/a");
        assert_eq!(cells[3], ("Top topic", "IT".to_string()));
        assert_eq!(cells[4], ("Top class", "M".to_string()));
        assert_eq!(cells[5].1, "n/a");
        assert_eq!(cells[6].1, "25.0%");
    }
}

//! UI rendering for the TUI

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::app::App;
use super::msg::Focus;
use super::views::{charts, kpis, preview};
use super::widgets::filter_picker;
use crate::dashboard::Snapshot;
use crate::table::PerformanceClass;

/// Main draw function - orchestrates all rendering
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(10),   // Content
        Constraint::Length(1), // Footer/status
    ])
    .split(area);

    draw_header(frame, app, main_layout[0]);

    let content = Layout::horizontal([Constraint::Length(34), Constraint::Min(40)]).split(main_layout[1]);
    filter_picker::draw(frame, &app.filters, &app.model, content[0]);

    match &app.snapshot {
        Snapshot::NoMatches { message } => draw_no_matches(frame, message, content[1]),
        Snapshot::Ready(data) => {
            let right = Layout::vertical([
                Constraint::Length(3),      // KPIs
                Constraint::Percentage(60), // Charts
                Constraint::Min(5),         // Preview
            ])
            .split(content[1]);
            kpis::draw(frame, &data.kpis, right[0]);
            charts::draw(frame, &data.charts, right[1]);
            preview::draw(
                frame,
                &data.preview,
                app.model.preview_offset,
                app.model.focus == Focus::Preview,
                right[2],
            );
        }
    }

    draw_footer(frame, app, main_layout[2]);

    if app.model.help_open {
        draw_help_overlay(frame, area);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.dataset().table().len();
    let shown = match &app.snapshot {
        Snapshot::Ready(data) => data.kpis.students,
        Snapshot::NoMatches { .. } => 0,
    };
    let refresh_indicator = if app.refresh_shown_at.is_some() { " [Updated]" } else { "" };

    let header_text = format!(
        " engagedash │ {} │ [{}/{} students]{}",
        app.raw_path().display(),
        shown,
        total,
        refresh_indicator
    );

    let header = Paragraph::new(header_text).style(Style::default().bg(Color::Blue).fg(Color::White).bold());
    frame.render_widget(header, area);
}

fn draw_no_matches(frame: &mut Frame, message: &str, area: Rect) {
    let warning = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Yellow).bold())),
        Line::from(""),
        Line::from(Span::styled(
            "Select more options or press r to reset the filters",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(warning, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keybinds = match app.model.focus {
        Focus::Filters => "j/k:option  h/l:field  space:toggle  a:all  n:none  r:reset  Tab:preview  ?:help  q:quit",
        Focus::Preview => "j/k:scroll  Ctrl+d/u:page  g/G:top/bottom  Tab:filters  R:reload  ?:help  q:quit",
    };

    let footer_text = if let Some((ref msg, _)) = app.status_message {
        msg.clone()
    } else {
        keybinds.to_string()
    };

    let footer = Paragraph::new(format!(" {}", footer_text)).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(footer, area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 26.min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: (area.width - popup_width) / 2,
        y: (area.height - popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let help_text = r#"
  Filters
  ─────────────────────────────────
  j/k, ↑/↓     Move between options
  h/l, ←/→     Previous/next field
  Space/Enter  Toggle option
  a            Select every option
  n            Deselect every option
  r            Reset all filters

  Preview
  ─────────────────────────────────
  j/k, ↑/↓     Scroll
  Ctrl+d/u     Page down/up
  g/G          Top/bottom

  General
  ─────────────────────────────────
  Tab          Switch panel
  R            Reload raw data
  q            Quit

  Press ? or Esc to close
"#;

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(help, popup_area);
}

/// Get color for a performance class label
pub fn class_color(label: &str) -> Color {
    match PerformanceClass::parse(label) {
        Some(PerformanceClass::Low) => Color::Red,
        Some(PerformanceClass::Medium) => Color::Yellow,
        Some(PerformanceClass::High) => Color::Green,
        None => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::backend::TestBackend;
    use std::fs;

    fn app(dir: &tempfile::TempDir) -> App {
        let raw = dir.path().join("raw.csv");
        fs::write(
            &raw,
            "Topic,raisedhands,VisITedResources,AnnouncementsView,Discussion,Class\n\
             Math,10,20,5,3,H\nIT,0,5,1,9,L\nMath,5,10,2,4,M\nIT,7,12,8,1,L\n",
        )
        .unwrap();
        let mut config = Config::default();
        config.data.raw_path = raw;
        config.data.processed_dir = dir.path().join("processed");
        App::new(config).unwrap()
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 48)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_class_color() {
        assert_eq!(class_color("L"), Color::Red);
        assert_eq!(class_color("high"), Color::Green);
        assert_eq!(class_color("n/a"), Color::Gray);
    }

    #[test]
    fn test_draw_dashboard() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app(&dir);
        let screen = render(&app);
        assert!(screen.contains("engagedash"));
        assert!(screen.contains("Students"));
        assert!(screen.contains("Preview"));
    }

    #[test]
    fn test_draw_no_matches() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = app(&dir);
        app.dispatch(crate::tui::msg::Msg::ClearOptions);
        let screen = render(&app);
        assert!(screen.contains("No data matches the selected filters"));
    }

    #[test]
    fn test_draw_help() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = app(&dir);
        app.dispatch(crate::tui::msg::Msg::ToggleHelp);
        assert!(render(&app).contains("Press ? or Esc to close"));
    }
}

//! Chart panels - the four dashboard charts drawn with ratatui widgets

use ratatui::{
    prelude::*,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

use crate::tui::state::truncate_str;
use crate::tui::ui::class_color;
use crate::visuals::{self, BoxPlot, BoxStats, Histogram, ScatterChart};

/// Draw the charts in a 2x2 grid
pub fn draw(frame: &mut Frame, charts: &[visuals::Chart], area: Rect) {
    let rows = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);
    let cells: Vec<Rect> = rows
        .iter()
        .flat_map(|row| Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(*row).to_vec())
        .collect();

    for (chart, cell) in charts.iter().zip(cells) {
        draw_chart(frame, chart, cell);
    }
}

fn block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
}

fn draw_chart(frame: &mut Frame, chart: &visuals::Chart, area: Rect) {
    match chart {
        visuals::Chart::Histogram(h) => draw_histogram(frame, h, area),
        visuals::Chart::BoxPlot(b) => draw_box_plot(frame, b, area),
        visuals::Chart::Bar(b) => draw_bar(frame, b, area),
        visuals::Chart::Scatter(s) => draw_scatter(frame, s, area),
    }
}

fn draw_empty(frame: &mut Frame, title: &str, area: Rect) {
    let empty = Paragraph::new("Not enough data")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(block(title));
    frame.render_widget(empty, area);
}

/// Overlaid per-class lines through the bin counts
fn draw_histogram(frame: &mut Frame, hist: &Histogram, area: Rect) {
    if hist.bin_edges.len() < 2 {
        return draw_empty(frame, &hist.title, area);
    }
    let centers: Vec<f64> = hist.bin_edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    let series: Vec<(String, Vec<(f64, f64)>)> = hist
        .series
        .iter()
        .map(|s| {
            let points = centers.iter().zip(&s.counts).map(|(x, c)| (*x, *c as f64)).collect();
            (s.class.clone(), points)
        })
        .collect();
    let max_count = hist.series.iter().flat_map(|s| s.counts.iter()).copied().max().unwrap_or(0) as f64;
    let x_bounds = [hist.bin_edges[0], hist.bin_edges[hist.bin_edges.len() - 1]];

    let datasets = series
        .iter()
        .map(|(class, points)| {
            Dataset::default()
                .name(class.as_str())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(class_color(class)))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block(&hist.title))
        .x_axis(
            Axis::default()
                .title(hist.x_label.as_str())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, max_count.max(1.0)])
                .labels(axis_labels([0.0, max_count.max(1.0)])),
        );
    frame.render_widget(chart, area);
}

/// One text row per class: whiskers, box and median on a shared scale
fn draw_box_plot(frame: &mut Frame, plot: &BoxPlot, area: Rect) {
    let Some((lo, hi)) = box_range(&plot.groups) else {
        return draw_empty(frame, &plot.title, area);
    };
    let inner_width = area.width.saturating_sub(2) as usize;
    let label_width = plot.groups.iter().map(|g| g.class.len()).max().unwrap_or(1) + 1;
    let track = inner_width.saturating_sub(label_width);

    let mut lines: Vec<Line> = plot
        .groups
        .iter()
        .map(|g| {
            Line::from(vec![
                Span::styled(format!("{:<width$}", g.class, width = label_width), Style::default().bold()),
                Span::styled(box_line(g, lo, hi, track), Style::default().fg(class_color(&g.class))),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled(
        format!("{:<width$}{:.1} .. {:.1}", "", lo, hi, width = label_width),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block(&plot.title)), area);
}

/// Horizontal bars, highest mean first
fn draw_bar(frame: &mut Frame, chart: &visuals::BarChart, area: Rect) {
    if chart.bars.is_empty() {
        return draw_empty(frame, &chart.title, area);
    }
    let label_width = (area.width / 3).max(6) as usize;
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .map(|b| {
            let value = b.value.unwrap_or(0.0);
            Bar::default()
                .value(value.round().max(0.0) as u64)
                .text_value(b.value.map_or("n/a".to_string(), |v| format!("{:.1}", v)))
                .label(Line::from(truncate_str(&b.label, label_width)))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    let widget = BarChart::default()
        .block(block(&chart.title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(100)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(widget, area);
}

/// Per-class point clouds with their trend lines
fn draw_scatter(frame: &mut Frame, chart: &ScatterChart, area: Rect) {
    let all_points: Vec<(f64, f64)> = chart.series.iter().flat_map(|s| s.points.iter().copied()).collect();
    if all_points.is_empty() {
        return draw_empty(frame, &chart.title, area);
    }
    let x_bounds = padded_bounds(all_points.iter().map(|p| p.0));
    let y_bounds = padded_bounds(all_points.iter().map(|p| p.1));

    let trends: Vec<(String, Vec<(f64, f64)>)> = chart
        .series
        .iter()
        .filter_map(|s| {
            let t = s.trend.as_ref()?;
            Some((s.class.clone(), vec![(t.x_min, t.at(t.x_min)), (t.x_max, t.at(t.x_max))]))
        })
        .collect();

    let mut datasets: Vec<Dataset> = chart
        .series
        .iter()
        .map(|s| {
            Dataset::default()
                .name(s.class.as_str())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(class_color(&s.class)))
                .data(&s.points)
        })
        .collect();
    datasets.extend(trends.iter().map(|(class, line)| {
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(class_color(class)))
            .data(line)
    }));

    let widget = Chart::new(datasets)
        .block(block(&chart.title))
        .x_axis(
            Axis::default()
                .title(chart.x_label.as_str())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.as_str())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    frame.render_widget(widget, area);
}

fn axis_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]].iter().map(|v| format!("{:.0}", v)).collect()
}

/// Min and max, widened by one unit when they coincide
pub fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        [0.0, 1.0]
    } else if lo == hi {
        [lo - 1.0, hi + 1.0]
    } else {
        [lo, hi]
    }
}

/// Shared scale for all groups, covering whiskers and outliers
pub fn box_range(groups: &[BoxStats]) -> Option<(f64, f64)> {
    let values = groups
        .iter()
        .flat_map(|g| [g.whisker_low, g.whisker_high].into_iter().chain(g.outliers.iter().copied()));
    let [lo, hi] = padded_bounds(values);
    if groups.is_empty() {
        None
    } else {
        Some((lo, hi))
    }
}

/// Render one box as text: `·` outliers, `─` whiskers, `█` the box, `┃` the median
pub fn box_line(stats: &BoxStats, lo: f64, hi: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let pos = |v: f64| -> usize {
        let frac = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
        ((frac * (width - 1) as f64).round() as usize).min(width - 1)
    };
    let mut cells = vec![' '; width];
    let mut fill = |a: usize, b: usize, ch: char| {
        for c in &mut cells[a.min(b)..=a.max(b)] {
            *c = ch;
        }
    };
    fill(pos(stats.whisker_low), pos(stats.whisker_high), '─');
    fill(pos(stats.q1), pos(stats.q3), '█');
    cells[pos(stats.median)] = '┃';
    for v in &stats.outliers {
        cells[pos(*v)] = '·';
    }
    cells.into_iter().collect()
}

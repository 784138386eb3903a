//! Chart specifications
//!
//! Pure builders from a table to a serializable chart description. The TUI
//! draws them with ratatui widgets; the web view and report hand the same
//! JSON to plotly.js.

use serde::Serialize;

use crate::metrics::{by_topic, median};
use crate::table::{columns, PerformanceClass, Table};

/// Series name for rows without a class label
pub const MISSING_CLASS: &str = "n/a";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Histogram(Histogram),
    BoxPlot(BoxPlot),
    Bar(BarChart),
    Scatter(ScatterChart),
}

impl Chart {
    pub fn title(&self) -> &str {
        match self {
            Chart::Histogram(c) => &c.title,
            Chart::BoxPlot(c) => &c.title,
            Chart::Bar(c) => &c.title,
            Chart::Scatter(c) => &c.title,
        }
    }
}

/// Engagement distribution, one overlaid series per class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub title: String,
    pub x_label: String,
    /// `bins + 1` ascending edges; empty when there is nothing to bin
    pub bin_edges: Vec<f64>,
    pub series: Vec<HistogramSeries>,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub class: String,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlot {
    pub title: String,
    pub groups: Vec<BoxStats>,
}

/// Five-number summary with Tukey whiskers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub class: String,
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub class: String,
    pub points: Vec<(f64, f64)>,
    pub trend: Option<TrendLine>,
}

/// Least-squares fit `y = intercept + slope * x` over `[x_min, x_max]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub x_min: f64,
    pub x_max: f64,
}

impl TrendLine {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// Row indices per class label: recognized classes in Low/Medium/High order,
/// then other labels alphabetically, then rows with no label
fn class_groups(table: &Table) -> Vec<(String, Vec<usize>)> {
    let Some(labels) = table.texts(columns::CLASS) else {
        return vec![("All".to_string(), (0..table.len()).collect())];
    };
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (row, label) in labels.into_iter().enumerate() {
        let key = label.unwrap_or(MISSING_CLASS);
        match groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((key.to_string(), vec![row])),
        }
    }
    groups.sort_by_key(|(key, _)| {
        let rank = match PerformanceClass::parse(key) {
            Some(class) => class.code(),
            None if key == MISSING_CLASS => 4,
            None => 3,
        };
        (rank, key.clone())
    });
    groups
}

fn pick(values: &[Option<f64>], rows: &[usize]) -> Vec<f64> {
    rows.iter().filter_map(|&r| values[r]).collect()
}

// =============================================================================
// Builders
// =============================================================================

/// Histogram of engagement with `bins` equal-width bins, overlaid by class
pub fn hist_engagement(table: &Table, bins: usize) -> Histogram {
    let bins = bins.max(1);
    let scores = table
        .numbers(columns::ENGAGEMENT_SCORE)
        .unwrap_or_else(|| vec![None; table.len()]);
    let all: Vec<f64> = scores.iter().flatten().copied().collect();

    let mut histogram = Histogram {
        title: "Distribution of Engagement Score".to_string(),
        x_label: columns::ENGAGEMENT_SCORE.to_string(),
        bin_edges: Vec::new(),
        series: Vec::new(),
        opacity: 0.75,
    };
    let Some((lo, hi)) = bounds(&all) else {
        return histogram;
    };
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;
    histogram.bin_edges = (0..bins).map(|i| lo + width * i as f64).collect();
    histogram.bin_edges.push(hi);

    for (class, rows) in class_groups(table) {
        let mut counts = vec![0usize; bins];
        for v in pick(&scores, &rows) {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }
        histogram.series.push(HistogramSeries { class, counts });
    }
    histogram
}

/// Engagement box plot per class
pub fn box_by_class(table: &Table) -> BoxPlot {
    let scores = table
        .numbers(columns::ENGAGEMENT_SCORE)
        .unwrap_or_else(|| vec![None; table.len()]);
    let groups = class_groups(table)
        .into_iter()
        .filter_map(|(class, rows)| box_stats(class, pick(&scores, &rows)))
        .collect();
    BoxPlot {
        title: "Engagement by Class (L/M/H)".to_string(),
        groups,
    }
}

/// Mean engagement for the top `top_n` topics, highest first
pub fn bar_topic(table: &Table, top_n: usize) -> BarChart {
    BarChart {
        title: format!("Top {} Topics by Mean Engagement", top_n),
        bars: by_topic(table, Some(top_n))
            .into_iter()
            .map(|t| Bar {
                label: t.topic,
                value: t.mean_engagement,
            })
            .collect(),
    }
}

/// Visited resources against raised hands, coloured by class, one trend per class
pub fn scatter_resources_vs_hands(table: &Table) -> ScatterChart {
    let mut chart = ScatterChart {
        title: "Visited Resources vs Raised Hands".to_string(),
        x_label: columns::VISITED_RESOURCES.to_string(),
        y_label: columns::RAISED_HANDS.to_string(),
        series: Vec::new(),
    };
    let (Some(xs), Some(ys)) = (
        table.numbers(columns::VISITED_RESOURCES),
        table.numbers(columns::RAISED_HANDS),
    ) else {
        return chart;
    };
    for (class, rows) in class_groups(table) {
        let points: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|&r| Some((xs[r]?, ys[r]?)))
            .collect();
        if points.is_empty() {
            continue;
        }
        let trend = fit_trend(&points);
        chart.series.push(ScatterSeries { class, points, trend });
    }
    chart
}

// =============================================================================
// Numeric helpers
// =============================================================================

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Linear-interpolated quantile of sorted values
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn box_stats(class: String, mut values: Vec<f64>) -> Option<BoxStats> {
    values.sort_by(f64::total_cmp);
    let q1 = quantile(&values, 0.25)?;
    let q3 = quantile(&values, 0.75)?;
    let med = median(&values)?;
    let iqr = q3 - q1;
    let (fence_lo, fence_hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let inside: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| (fence_lo..=fence_hi).contains(v))
        .collect();
    let (whisker_low, whisker_high) = bounds(&inside).unwrap_or((q1, q3));
    Some(BoxStats {
        class,
        count: values.len(),
        q1,
        median: med,
        q3,
        whisker_low,
        whisker_high,
        outliers: values
            .iter()
            .copied()
            .filter(|v| !(fence_lo..=fence_hi).contains(v))
            .collect(),
    })
}

/// Ordinary least squares. `None` with fewer than two points or constant x.
pub fn fit_trend(points: &[(f64, f64)]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let slope = sxy / sxx;
    let (x_min, x_max) = bounds(&points.iter().map(|p| p.0).collect::<Vec<_>>())?;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
        x_min,
        x_max,
    })
}

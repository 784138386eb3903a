//! One render pass of the dashboard
//!
//! Filter the derived table, stop early if nothing matches, otherwise compute
//! the KPIs, group-bys, charts and preview. Every shell (CLI summary, TUI, web
//! page, static report) renders from the same [`Snapshot`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::filters::FilterState;
use crate::metrics::{self, ClassSummary, Kpis, TopicSummary};
use crate::table::{Cell, Table};
use crate::visuals::{self, Chart};

pub const NO_MATCHES: &str = "No data matches the selected filters";

/// First rows of the filtered table, in file order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Rows in the filtered table, which may exceed `rows.len()`
    pub total_rows: usize,
}

impl Preview {
    fn from_table(table: &Table, limit: usize) -> Self {
        let head = table.head(limit);
        Self {
            headers: head.headers().to_vec(),
            rows: head.rows().to_vec(),
            total_rows: table.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub kpis: Kpis,
    pub by_class: Vec<ClassSummary>,
    pub by_topic: Vec<TopicSummary>,
    pub charts: Vec<Chart>,
    pub preview: Preview,
}

/// Outcome of a render pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Snapshot {
    /// The filters exclude every row; nothing else was computed
    NoMatches { message: String },
    Ready(Box<DashboardData>),
}

impl Snapshot {
    pub fn data(&self) -> Option<&DashboardData> {
        match self {
            Snapshot::Ready(data) => Some(data),
            Snapshot::NoMatches { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Snapshot::NoMatches { .. })
    }
}

/// Recompute everything for the current filter selection
pub fn build(table: &Table, filters: &FilterState, config: &DashboardConfig) -> Snapshot {
    let filtered = filters.apply(table);
    if filtered.is_empty() {
        warn!(total = table.len(), "{}", NO_MATCHES);
        return Snapshot::NoMatches {
            message: NO_MATCHES.to_string(),
        };
    }
    debug!(rows = filtered.len(), total = table.len(), "rendering dashboard");

    let charts = vec![
        Chart::Histogram(visuals::hist_engagement(&filtered, config.histogram_bins)),
        Chart::BoxPlot(visuals::box_by_class(&filtered)),
        Chart::Bar(visuals::bar_topic(&filtered, config.top_topics)),
        Chart::Scatter(visuals::scatter_resources_vs_hands(&filtered)),
    ];

    Snapshot::Ready(Box::new(DashboardData {
        kpis: metrics::kpis(&filtered),
        by_class: metrics::by_class(&filtered),
        by_topic: metrics::by_topic(&filtered, Some(config.top_topics)),
        charts,
        preview: Preview::from_table(&filtered, config.preview_rows),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterField;
    use crate::preprocess::clean_and_engineer;

    fn derived() -> Table {
        let headers = ["Topic", "gender", "raisedhands", "VisITedResources", "Class"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = [
            ["Math", "M", "10", "20", "H"],
            ["Math", "F", "0", "5", "L"],
            ["IT", "M", "5", "10", "M"],
            ["IT", "F", "8", "15", "L"],
        ]
        .iter()
        .map(|r| r.iter().map(|v| Cell::text(*v)).collect())
        .collect();
        clean_and_engineer(Table::from_rows(headers, rows))
    }

    #[test]
    fn test_build_all_selected() {
        let table = derived();
        let filters = FilterState::from_table(&table);
        let snapshot = build(&table, &filters, &DashboardConfig::default());
        let data = snapshot.data().unwrap();
        assert_eq!(data.kpis.students, 4);
        assert_eq!(data.charts.len(), 4);
        assert_eq!(data.preview.total_rows, 4);
        // Preview keeps the row order of the data file
        let classes: Vec<String> = data.preview.rows.iter().map(|r| r[4].to_string()).collect();
        assert_eq!(classes, vec!["H", "L", "M", "L"]);
    }

    #[test]
    fn test_build_no_matches_skips_everything() {
        let table = derived();
        let mut filters = FilterState::from_table(&table);
        filters.clear(FilterField::Topic);
        let snapshot = build(&table, &filters, &DashboardConfig::default());
        assert!(snapshot.is_empty());
        assert!(snapshot.data().is_none());
    }

    #[test]
    fn test_build_respects_filters_and_limits() {
        let table = derived();
        let mut filters = FilterState::from_table(&table);
        filters.select_only(FilterField::Topic, &["IT"]);
        let config = DashboardConfig {
            preview_rows: 1,
            ..DashboardConfig::default()
        };
        let snapshot = build(&table, &filters, &config);
        let data = snapshot.data().unwrap();
        assert_eq!(data.kpis.students, 2);
        assert_eq!(data.preview.rows.len(), 1);
        assert_eq!(data.preview.total_rows, 2);
        assert_eq!(data.preview.rows[0][4].to_string(), "M");
        assert_eq!(data.by_topic.len(), 1);
        assert_eq!(data.by_topic[0].topic, "IT");
    }

    #[test]
    fn test_preview_takes_leading_rows_unsorted() {
        let headers = ["id", "Topic", "raisedhands", "Class"].iter().map(|s| s.to_string()).collect();
        let rows = [["r1", "Math", "9", "H"], ["r2", "Math", "1", "L"], ["r3", "IT", "4", "M"]]
            .iter()
            .map(|r| r.iter().map(|v| Cell::text(*v)).collect())
            .collect();
        let table = clean_and_engineer(Table::from_rows(headers, rows));
        let config = DashboardConfig {
            preview_rows: 1,
            ..DashboardConfig::default()
        };
        let snapshot = build(&table, &FilterState::from_table(&table), &config);
        let preview = &snapshot.data().unwrap().preview;
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.rows[0][0].to_string(), "r1");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let table = derived();
        let mut filters = FilterState::from_table(&table);
        filters.clear(FilterField::Gender);
        let json = serde_json::to_value(build(&table, &filters, &DashboardConfig::default())).unwrap();
        assert_eq!(json["status"], "no_matches");
        assert_eq!(json["message"], NO_MATCHES);

        let filters = FilterState::from_table(&table);
        let json = serde_json::to_value(build(&table, &filters, &DashboardConfig::default())).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["kpis"]["students"], 4);
        assert_eq!(json["charts"][0]["kind"], "histogram");
    }
}

//! Browser rendering of the dashboard
//!
//! The same page backs `engagedash serve` (fetching JSON from the API) and
//! `engagedash report` (a standalone file with the data embedded).

pub mod html;

use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dashboard::Snapshot;
use crate::filters::FilterState;

/// A filter as the page sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterView<'a> {
    pub key: &'static str,
    pub label: &'static str,
    pub options: &'a [String],
    pub selected: Vec<&'a str>,
}

pub fn filter_views(state: &FilterState) -> Vec<FilterView<'_>> {
    state
        .filters()
        .iter()
        .map(|f| FilterView {
            key: f.field.key(),
            label: f.field.label(),
            options: &f.options,
            selected: f.selected.iter().map(String::as_str).collect(),
        })
        .collect()
}

/// Everything the page needs to draw one render pass
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub source: String,
    pub generated_at: String,
    pub filters: Vec<FilterView<'a>>,
    pub snapshot: &'a Snapshot,
}

impl<'a> Payload<'a> {
    pub fn new(source: &Path, filters: &'a FilterState, snapshot: &'a Snapshot) -> Self {
        Self {
            source: source.display().to_string(),
            generated_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            filters: filter_views(filters),
            snapshot,
        }
    }
}

/// Write a standalone HTML dashboard to `path`
pub fn generate(path: &Path, payload: &Payload<'_>) -> io::Result<()> {
    let json = serde_json::to_string(payload)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    html::write(&mut writer, Some(&json))?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::dashboard;
    use crate::filters::FilterField;
    use crate::table::{Cell, Table};

    fn table() -> Table {
        Table::from_rows(
            vec!["Topic".to_string(), "Class".to_string(), "engagement_score".to_string()],
            vec![
                vec![Cell::text("Math"), Cell::text("H"), Cell::Number(80.0)],
                vec![Cell::text("IT"), Cell::text("L"), Cell::Number(20.0)],
            ],
        )
    }

    #[test]
    fn test_filter_views_use_keys_and_labels() {
        let mut state = FilterState::from_table(&table());
        state.select_only(FilterField::Topic, &["IT"]);
        let views = filter_views(&state);
        assert_eq!(views[0].key, "topic");
        assert_eq!(views[0].selected, vec!["IT"]);
        assert_eq!(views[1].label, "Performance Class");
    }

    #[test]
    fn test_generate_embeds_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("report.html");
        let table = table();
        let state = FilterState::from_table(&table);
        let snapshot = dashboard::build(&table, &state, &DashboardConfig::default());
        generate(&out, &Payload::new(Path::new("raw.csv"), &state, &snapshot)).unwrap();

        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("\"status\":\"ready\""));
        assert!(html.contains("raw.csv"));
        assert!(!html.contains(html::DATA_PLACEHOLDER));
    }
}

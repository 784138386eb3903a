//! engagedash - student engagement analytics
//!
//! Turns a raw student-activity export into a cleaned table with a derived
//! engagement score, then renders KPIs, group-bys and four charts for any
//! filter selection.
//!
//! # Pipeline
//!
//! | Step | Module |
//! |------|--------|
//! | Load CSV, falling back to a legacy spreadsheet | [`loader`] |
//! | Normalize text, coerce numbers, score, order classes | [`preprocess`] |
//! | Memoize the derived table by raw-file hash | [`dataset`] |
//! | Filter, aggregate and chart | [`filters`], [`metrics`], [`visuals`], [`dashboard`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use engagedash::{dashboard, Config, Dataset, FilterState};
//!
//! let config = Config::load();
//! let dataset = Dataset::load(&config).unwrap();
//!
//! let mut filters = FilterState::from_table(dataset.table());
//! filters.restrict(&[("topic", "Math")]).unwrap();
//!
//! match dashboard::build(dataset.table(), &filters, &config.dashboard) {
//!     dashboard::Snapshot::Ready(data) => println!("{} students", data.kpis.students),
//!     dashboard::Snapshot::NoMatches { message } => eprintln!("{}", message),
//! }
//! ```

pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod loader;
pub mod metrics;
pub mod preprocess;
pub mod report;
pub mod serve;
pub mod table;
pub mod tui;
pub mod visuals;

pub use config::Config;
pub use dashboard::{DashboardData, Snapshot};
pub use dataset::Dataset;
pub use error::{DataError, Result};
pub use filters::{FilterField, FilterState};
pub use table::{Cell, ClassOrdinal, PerformanceClass, Table};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let table = Table::default();
        assert!(FilterState::from_table(&table).filters().is_empty());
        assert_eq!(PerformanceClass::ALL.len(), 3);
    }
}

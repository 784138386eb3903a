//! Application state for the TUI

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use super::msg::Msg;
use super::update::{update, Cmd, Model};
use crate::config::Config;
use crate::dashboard::{self, Snapshot};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::filters::FilterState;

/// Main application state
pub struct App {
    config: Config,
    raw_path: PathBuf,
    processed_path: PathBuf,

    // Data
    dataset: Dataset,
    pub filters: FilterState,
    pub snapshot: Snapshot,

    // Cursor and panel state, driven by update()
    pub model: Model,

    // Viewport
    pub viewport_width: u16,
    pub viewport_height: u16,

    // Refresh indicator
    pub refresh_shown_at: Option<Instant>,

    // Status message
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let raw_path = config.data.raw_path.clone();
        let processed_path = config.processed_path();
        let dataset = Dataset::prepare(&raw_path, &processed_path)?;
        let filters = FilterState::from_table(dataset.table());
        let snapshot = dashboard::build(dataset.table(), &filters, &config.dashboard);

        let mut app = Self {
            config,
            raw_path,
            processed_path,
            dataset,
            filters,
            snapshot,
            model: Model::default(),
            viewport_width: 80,
            viewport_height: 24,
            refresh_shown_at: None,
            status_message: None,
        };
        app.sync_model();
        Ok(app)
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run a message through update() and execute the resulting command.
    /// Returns true when the app should quit.
    pub fn dispatch(&mut self, msg: Msg) -> bool {
        let (model, cmd) = update(msg, std::mem::take(&mut self.model));
        self.model = model;
        self.execute(cmd)
    }

    fn execute(&mut self, cmd: Cmd) -> bool {
        match cmd {
            Cmd::None => false,
            Cmd::Quit => true,
            Cmd::Batch(cmds) => {
                let mut quit = false;
                for cmd in cmds {
                    quit |= self.execute(cmd);
                }
                quit
            }
            Cmd::ToggleOption { filter, option } => {
                let target = self
                    .filters
                    .filters()
                    .get(filter)
                    .and_then(|f| f.options.get(option).map(|o| (f.field, o.clone())));
                if let Some((field, value)) = target {
                    self.filters.toggle(field, &value);
                    self.recompute();
                }
                false
            }
            Cmd::SelectAll(filter) => {
                if let Some(field) = self.filters.filters().get(filter).map(|f| f.field) {
                    self.filters.select_all(field);
                    self.recompute();
                }
                false
            }
            Cmd::ClearFilter(filter) => {
                if let Some(field) = self.filters.filters().get(filter).map(|f| f.field) {
                    self.filters.clear(field);
                    self.recompute();
                }
                false
            }
            Cmd::ResetFilters => {
                self.filters.reset();
                self.recompute();
                false
            }
            Cmd::Reload => {
                self.reload();
                false
            }
            Cmd::SetStatus(message) => {
                self.set_status(message);
                false
            }
        }
    }

    /// Rebuild the snapshot for the current selection
    pub fn recompute(&mut self) {
        self.snapshot = dashboard::build(self.dataset.table(), &self.filters, &self.config.dashboard);
        if let Snapshot::NoMatches { message } = &self.snapshot {
            let message = message.clone();
            self.set_status(message);
        }
        self.sync_model();
    }

    /// Re-prepare if the raw file changed. Errors keep the current data.
    pub fn reload(&mut self) {
        match self.dataset.refresh(&self.raw_path, &self.processed_path) {
            Ok(Some(dataset)) => {
                info!(rows = dataset.table().len(), "raw data changed, dashboard reloaded");
                self.dataset = dataset;
                self.filters = FilterState::from_table(self.dataset.table());
                self.model = Model {
                    focus: self.model.focus,
                    ..Model::default()
                };
                self.recompute();
                self.show_refresh_indicator();
            }
            Ok(None) => self.set_status("Raw data unchanged".to_string()),
            Err(e) => {
                warn!(error = %e, "reload failed, keeping current data");
                self.set_status(format!("Reload failed: {}", e));
            }
        }
    }

    /// Copy data-dependent sizes into the model so update() can bound cursors
    fn sync_model(&mut self) {
        self.model.option_counts = self.filters.filters().iter().map(|f| f.options.len()).collect();
        self.model.preview_rows = self.snapshot.data().map_or(0, |d| d.preview.rows.len());
        self.model.preview_offset = self.model.preview_offset.min(self.model.preview_rows.saturating_sub(1));
        self.model.filter_index = self.model.filter_index.min(self.model.option_counts.len().saturating_sub(1));
    }

    pub fn show_refresh_indicator(&mut self) {
        self.refresh_shown_at = Some(Instant::now());
    }

    /// Periodic tick for expiring indicators
    pub fn tick(&mut self) {
        if let Some(shown_at) = self.refresh_shown_at {
            if shown_at.elapsed().as_secs() >= 2 {
                self.refresh_shown_at = None;
            }
        }

        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed().as_secs() >= 3 {
                self.status_message = None;
            }
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport_width = width;
        self.viewport_height = height;
        // Preview panel takes roughly the bottom third of the screen
        self.model.visible_rows = (height as usize / 3).saturating_sub(3).max(1);
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterField;
    use crate::tui::msg::Focus;
    use std::fs;
    use tempfile::TempDir;

    const RAW: &str = "\
Topic,gender,raisedhands,VisITedResources,Class
Math,M,10,20,H
IT,F,0,5,L
Math,F,5,10,M
";

    fn app(dir: &TempDir) -> App {
        let raw = dir.path().join("raw.csv");
        fs::write(&raw, RAW).unwrap();
        let mut config = Config::default();
        config.data.raw_path = raw;
        config.data.processed_dir = dir.path().join("processed");
        App::new(config).unwrap()
    }

    #[test]
    fn test_new_builds_snapshot() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        assert_eq!(app.snapshot.data().unwrap().kpis.students, 3);
        // Topic, Gender, Class
        assert_eq!(app.model.option_counts, vec![2, 2, 3]);
        assert_eq!(app.model.preview_rows, 3);
    }

    #[test]
    fn test_toggle_recomputes() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        // First topic option is "IT"
        assert!(!app.dispatch(Msg::ToggleOption));
        assert_eq!(app.snapshot.data().unwrap().kpis.students, 2);
        assert!(!app.filters.filter(FilterField::Topic).unwrap().is_selected("IT"));
    }

    #[test]
    fn test_clear_then_reset() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.dispatch(Msg::ClearOptions);
        assert!(app.snapshot.is_empty());
        assert_eq!(app.model.preview_rows, 0);
        assert!(app.status_message.is_some());

        app.dispatch(Msg::ResetFilters);
        assert!(app.filters.is_all_selected());
        assert_eq!(app.filters.generation(), 1);
        assert_eq!(app.snapshot.data().unwrap().kpis.students, 3);
    }

    #[test]
    fn test_reload_picks_up_raw_changes() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.dispatch(Msg::NextPanel);
        fs::write(app.raw_path().to_path_buf(), format!("{}IT,M,7,7,M\n", RAW)).unwrap();
        app.dispatch(Msg::RawChanged);
        assert_eq!(app.snapshot.data().unwrap().kpis.students, 4);
        assert_eq!(app.model.focus, Focus::Preview);
        assert!(app.refresh_shown_at.is_some());
    }

    #[test]
    fn test_reload_without_change_keeps_data() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let before = app.dataset().fingerprint().to_string();
        app.dispatch(Msg::Reload);
        assert_eq!(app.dataset().fingerprint(), before);
        assert_eq!(app.status_message.as_ref().unwrap().0, "Raw data unchanged");
    }

    #[test]
    fn test_quit() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert!(app.dispatch(Msg::Quit));
    }
}

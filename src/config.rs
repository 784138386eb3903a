//! Configuration file support for engagedash
//!
//! Reads from .engagedash/config.toml or engagedash.toml, whichever is found
//! first walking up from the working directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Input and cache locations
    #[serde(default)]
    pub data: DataConfig,

    /// Display settings shared by the TUI, web view and report
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Web dashboard settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the raw export and the processed cache live
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DataConfig {
    /// Raw export. Default: data/raw/xAPI-Edu-Data.csv
    #[serde(default = "default_raw_path")]
    pub raw_path: PathBuf,

    /// Directory for the processed cache. Default: data/processed
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Cache file name. Default: xapi_edu_processed.csv
    #[serde(default = "default_processed_name")]
    pub processed_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Topics shown in the bar chart. Default: 10
    #[serde(default = "default_top_topics")]
    pub top_topics: usize,

    /// Rows in the data preview. Default: 100
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Histogram bins. Default: 30
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Default: 3001
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_raw_path() -> PathBuf {
    PathBuf::from("data/raw/xAPI-Edu-Data.csv")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_processed_name() -> String {
    "xapi_edu_processed.csv".to_string()
}

fn default_top_topics() -> usize {
    10
}

fn default_preview_rows() -> usize {
    100
}

fn default_histogram_bins() -> usize {
    30
}

fn default_port() -> u16 {
    3001
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_path: default_raw_path(),
            processed_dir: default_processed_dir(),
            processed_name: default_processed_name(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_topics: default_top_topics(),
            preview_rows: default_preview_rows(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load config from disk, then apply environment overrides.
    /// Returns default config if no file is found or it fails to parse.
    pub fn load() -> Self {
        let mut config = Self::find_config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Parse a specific config file
    pub fn load_from(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
                None
            }
        }
    }

    /// ENGAGEDASH_RAW_PATH and ENGAGEDASH_PROCESSED_DIR take priority over the file
    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("ENGAGEDASH_RAW_PATH") {
            self.data.raw_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("ENGAGEDASH_PROCESSED_DIR") {
            self.data.processed_dir = PathBuf::from(dir);
        }
    }

    /// Find the config file by walking up the directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let candidates = [
                dir.join(".engagedash").join("config.toml"),
                dir.join("engagedash.toml"),
            ];
            if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
                return Some(found);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Full path of the processed cache file
    pub fn processed_path(&self) -> PathBuf {
        self.data.processed_dir.join(&self.data.processed_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.raw_path, PathBuf::from("data/raw/xAPI-Edu-Data.csv"));
        assert_eq!(
            config.processed_path(),
            PathBuf::from("data/processed/xapi_edu_processed.csv")
        );
        assert_eq!(config.dashboard.top_topics, 10);
        assert_eq!(config.dashboard.preview_rows, 100);
        assert_eq!(config.dashboard.histogram_bins, 30);
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[data]
raw_path = "input/students.csv"

[dashboard]
top_topics = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.data.raw_path, PathBuf::from("input/students.csv"));
        assert_eq!(config.data.processed_name, "xapi_edu_processed.csv");
        assert_eq!(config.dashboard.top_topics, 5);
        assert_eq!(config.dashboard.preview_rows, 100);
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_load_from_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engagedash.toml");
        std::fs::write(&path, "[dashboard\ntop_topics = ").unwrap();
        assert!(Config::load_from(&path).is_none());
    }
}

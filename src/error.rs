//! Error type for loading, caching and persisting tables

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the I/O boundary.
///
/// Cleaning and aggregation never fail: unusable values become missing and
/// undefined statistics become `None`. Only reading and writing files can.
#[derive(Debug, Error)]
pub enum DataError {
    /// The raw file could not be read in either supported format
    #[error("could not load raw data from {path}: csv: {csv}; legacy spreadsheet: {legacy}")]
    Unavailable {
        path: PathBuf,
        csv: String,
        legacy: String,
    },

    #[error("processed cache not found at {0}")]
    CacheMissing(PathBuf),

    #[error("cache manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

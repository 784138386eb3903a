//! The derived table, computed once and reused
//!
//! The cache is keyed by a SHA-256 of the raw file. A small JSON manifest
//! next to the processed CSV records the hash it was built from; when the raw
//! file changes the hash no longer matches and the table is derived again.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DataError, Result};
use crate::loader;
use crate::preprocess::clean_and_engineer;
use crate::table::Table;

/// Written beside the processed cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub raw_sha256: String,
    pub rows: usize,
    pub created_at: String,
}

/// Where a prepared table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Derived,
}

/// An immutable derived table plus the raw-input hash it belongs to
#[derive(Debug, Clone)]
pub struct Dataset {
    table: Arc<Table>,
    fingerprint: String,
    source: Source,
}

/// Hex SHA-256 of a file's bytes
pub fn fingerprint(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

pub fn manifest_path(processed: &Path) -> PathBuf {
    processed.with_extension("meta.json")
}

fn read_manifest(path: &Path) -> Option<CacheManifest> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_manifest(path: &Path, manifest: &CacheManifest) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(manifest)?)?;
    Ok(())
}

impl Dataset {
    /// Prepare using the configured locations
    pub fn load(config: &Config) -> Result<Self> {
        Self::prepare(&config.data.raw_path, &config.processed_path())
    }

    /// Reuse the cache if it was built from this exact raw file, otherwise
    /// load, clean and re-cache. Fails only if the raw file is unavailable.
    pub fn prepare(raw: &Path, processed: &Path) -> Result<Self> {
        let fingerprint = fingerprint(raw).map_err(|e| DataError::Unavailable {
            path: raw.to_path_buf(),
            csv: e.to_string(),
            legacy: "not attempted".to_string(),
        })?;

        let manifest = manifest_path(processed);
        if let Some(stored) = read_manifest(&manifest) {
            if stored.raw_sha256 == fingerprint {
                match loader::load_processed(processed) {
                    Ok(table) => {
                        info!(path = %processed.display(), rows = table.len(), "using processed cache");
                        return Ok(Self {
                            table: Arc::new(table),
                            fingerprint,
                            source: Source::Cache,
                        });
                    }
                    Err(e) => warn!(error = %e, "processed cache unreadable, rebuilding"),
                }
            } else {
                info!("raw data changed since the cache was built, rebuilding");
            }
        }

        let table = clean_and_engineer(loader::load_raw(raw)?);
        if let Err(e) = Self::persist(&table, processed, &fingerprint) {
            warn!(error = %e, path = %processed.display(), "could not write processed cache");
        }
        Ok(Self {
            table: Arc::new(table),
            fingerprint,
            source: Source::Derived,
        })
    }

    fn persist(table: &Table, processed: &Path, fingerprint: &str) -> Result<()> {
        loader::save_processed(table, processed)?;
        write_manifest(
            &manifest_path(processed),
            &CacheManifest {
                raw_sha256: fingerprint.to_string(),
                rows: table.len(),
                created_at: Utc::now().to_rfc3339(),
            },
        )
    }

    /// Prepare again only if the raw file's hash has changed
    pub fn refresh(&self, raw: &Path, processed: &Path) -> Result<Option<Self>> {
        match fingerprint(raw) {
            Ok(current) if current == self.fingerprint => Ok(None),
            _ => Self::prepare(raw, processed).map(Some),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Shared handle to the derived table
    pub fn shared(&self) -> Arc<Table> {
        Arc::clone(&self.table)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn source(&self) -> Source {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::columns;
    use tempfile::TempDir;

    const RAW: &str = "Topic,raisedhands,Class\nMath,10,H\nIT,0,L\n";

    fn setup(dir: &TempDir, contents: &str) -> (PathBuf, PathBuf) {
        let raw = dir.path().join("raw.csv");
        fs::write(&raw, contents).unwrap();
        (raw, dir.path().join("processed").join("cache.csv"))
    }

    #[test]
    fn test_first_prepare_derives_and_caches() {
        let dir = TempDir::new().unwrap();
        let (raw, processed) = setup(&dir, RAW);
        let ds = Dataset::prepare(&raw, &processed).unwrap();
        assert_eq!(ds.source(), Source::Derived);
        assert!(processed.exists());
        let manifest = read_manifest(&manifest_path(&processed)).unwrap();
        assert_eq!(manifest.raw_sha256, ds.fingerprint());
        assert_eq!(manifest.rows, 2);
    }

    #[test]
    fn test_second_prepare_hits_cache() {
        let dir = TempDir::new().unwrap();
        let (raw, processed) = setup(&dir, RAW);
        let first = Dataset::prepare(&raw, &processed).unwrap();
        let second = Dataset::prepare(&raw, &processed).unwrap();
        assert_eq!(second.source(), Source::Cache);
        assert_eq!(second.table(), first.table());
    }

    #[test]
    fn test_changed_raw_invalidates_cache() {
        let dir = TempDir::new().unwrap();
        let (raw, processed) = setup(&dir, RAW);
        let first = Dataset::prepare(&raw, &processed).unwrap();
        assert!(first.refresh(&raw, &processed).unwrap().is_none());

        fs::write(&raw, "Topic,raisedhands,Class\nMath,10,H\nIT,0,L\nIT,5,M\n").unwrap();
        let refreshed = first.refresh(&raw, &processed).unwrap().unwrap();
        assert_eq!(refreshed.source(), Source::Derived);
        assert_eq!(refreshed.table().len(), 3);
        assert_ne!(refreshed.fingerprint(), first.fingerprint());
        // The earlier table is untouched
        assert_eq!(first.table().len(), 2);
    }

    #[test]
    fn test_missing_raw_is_fatal_even_with_cache() {
        let dir = TempDir::new().unwrap();
        let (raw, processed) = setup(&dir, RAW);
        Dataset::prepare(&raw, &processed).unwrap();
        fs::remove_file(&raw).unwrap();
        let err = Dataset::prepare(&raw, &processed).unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
    }

    #[test]
    fn test_cache_keeps_derived_columns() {
        let dir = TempDir::new().unwrap();
        let (raw, processed) = setup(&dir, RAW);
        Dataset::prepare(&raw, &processed).unwrap();
        let cached = Dataset::prepare(&raw, &processed).unwrap();
        assert_eq!(
            cached.table().numbers(columns::ENGAGEMENT_SCORE).unwrap(),
            vec![Some(100.0), Some(0.0)]
        );
        assert_eq!(
            cached.table().numbers(columns::CLASS_ORDINAL).unwrap(),
            vec![Some(2.0), Some(0.0)]
        );
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            fingerprint(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

//! Reading the raw export and the processed cache
//!
//! The raw file is read as CSV first. If that fails the same file is tried as
//! a legacy Excel workbook, and only when both fail is the data reported
//! unavailable. The processed cache is always CSV with a header row.

use calamine::{open_workbook, Data, Reader, Xls};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};
use crate::table::{columns, Cell, Table};

/// Load the raw student table, falling back to the spreadsheet reader
pub fn load_raw(path: &Path) -> Result<Table> {
    let csv_error = match read_csv(path) {
        Ok(table) => {
            info!(path = %path.display(), rows = table.len(), "loaded raw data as csv");
            return Ok(table);
        }
        Err(e) => e,
    };
    warn!(path = %path.display(), error = %csv_error, "csv read failed, trying legacy spreadsheet");

    match read_legacy_spreadsheet(path) {
        Ok(table) => {
            info!(path = %path.display(), rows = table.len(), "loaded raw data as spreadsheet");
            Ok(table)
        }
        Err(legacy) => Err(DataError::Unavailable {
            path: path.to_path_buf(),
            csv: csv_error.to_string(),
            legacy,
        }),
    }
}

/// Read a CSV file with a header row. Every value is kept as text.
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(String::is_empty) {
        return Err(DataError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "file has no header row",
        )));
    }

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(Cell::text).collect());
    }
    Ok(table)
}

/// Read the first worksheet of a legacy `.xls` workbook
pub fn read_legacy_spreadsheet(path: &Path) -> std::result::Result<Table, String> {
    let mut workbook = open_workbook::<Xls<_>, _>(path).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| "worksheet is empty".to_string())?
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    let numeric: Vec<bool> = headers.iter().map(|h| columns::is_numeric(h)).collect();
    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(
            row.iter()
                .enumerate()
                .map(|(i, data)| spreadsheet_cell(data, numeric.get(i).copied().unwrap_or(false)))
                .collect(),
        );
    }
    Ok(table)
}

/// Numbers survive only in numeric catalogue columns. Everywhere else they
/// become text, matching what a CSV read and the processed cache produce.
fn spreadsheet_cell(data: &Data, numeric: bool) -> Cell {
    let number = match data {
        Data::Empty => return Cell::Missing,
        Data::String(s) => return Cell::text(s.clone()),
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        other => return Cell::text(other.to_string()),
    };
    if numeric {
        Cell::Number(number)
    } else {
        Cell::text(Cell::Number(number).to_string())
    }
}

/// Write the derived table to the cache location, creating its directory
pub fn save_processed(table: &Table, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    write_table(&mut writer, table)?;
    writer.flush()?;
    debug!(path = %path.display(), rows = table.len(), "processed table saved");
    Ok(path.to_path_buf())
}

/// Write a table as CSV to any writer
pub fn write_table<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &Table) -> Result<()> {
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    Ok(())
}

/// Read the processed cache back. Behavioral and derived columns are numeric.
pub fn load_processed(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(DataError::CacheMissing(path.to_path_buf()));
    }
    let raw = read_csv(path)?;
    let numeric: Vec<bool> = raw.headers().iter().map(|h| columns::is_numeric(h)).collect();
    let rows = raw
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&numeric)
                .map(|(cell, is_numeric)| match cell {
                    Cell::Text(s) if *is_numeric => s.parse::<f64>().map_or(Cell::Missing, Cell::Number),
                    other => other.clone(),
                })
                .collect()
        })
        .collect();
    let table = Table::from_rows(raw.headers().to_vec(), rows);
    debug!(path = %path.display(), rows = table.len(), "processed table loaded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::clean_and_engineer;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
gender,NationalITy,Topic,raisedhands,VisITedResources,AnnouncementsView,Discussion,StudentAbsenceDays,Class
M,KW,IT,15,16,2,20,Under-7,M
F, lebanon ,Math,abc,80,12,70,Above-7,H
M,Jordan,\"Arabic, advanced\",10,7,0,30,Under-7,L
";

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_load_raw_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "raw.csv", SAMPLE.as_bytes());
        let table = load_raw(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers().len(), 9);
        assert_eq!(table.rows()[2][2], Cell::text("Arabic, advanced"));
        // Values stay raw text until the preprocessor runs
        assert_eq!(table.rows()[1][1], Cell::text(" lebanon "));
    }

    #[test]
    fn test_load_raw_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_raw(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_load_raw_unreadable_in_both_formats() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "garbage.csv", &[0xff, 0xfe, 0x00, 0x81, b'\n', 0xc3, 0x28]);
        let err = load_raw(&path).unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
    }

    #[test]
    fn test_empty_file_is_not_a_table() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", b"");
        assert!(read_csv(&path).is_err());
    }

    #[test]
    fn test_processed_round_trip() {
        let dir = TempDir::new().unwrap();
        let raw_path = write_file(&dir, "raw.csv", SAMPLE.as_bytes());
        let derived = clean_and_engineer(load_raw(&raw_path).unwrap());

        let cache = dir.path().join("processed").join("cache.csv");
        let written = save_processed(&derived, &cache).unwrap();
        assert_eq!(written, cache);

        let loaded = load_processed(&cache).unwrap();
        assert_eq!(loaded, derived);
        assert!(loaded.has_column(columns::ENGAGEMENT_SCORE));
        assert!(loaded.has_column(columns::CLASS_ORDINAL));
    }

    #[test]
    fn test_legacy_reader_rejects_non_workbook() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "raw.xls", SAMPLE.as_bytes());
        assert!(read_legacy_spreadsheet(&path).is_err());
    }

    #[test]
    fn test_spreadsheet_numbers_outside_numeric_columns_become_text() {
        assert_eq!(spreadsheet_cell(&Data::Float(15.0), true), Cell::Number(15.0));
        assert_eq!(spreadsheet_cell(&Data::Float(15.0), false), Cell::text("15"));
        assert_eq!(spreadsheet_cell(&Data::Int(7), false), Cell::text("7"));
        assert_eq!(spreadsheet_cell(&Data::Float(2.5), false), Cell::text("2.5"));
        assert_eq!(spreadsheet_cell(&Data::Empty, false), Cell::Missing);
    }

    #[test]
    fn test_spreadsheet_shaped_table_round_trips() {
        let headers = vec!["SectionID".to_string(), "extra".to_string(), "raisedhands".to_string(), "Class".to_string()];
        let rows = vec![
            vec![
                spreadsheet_cell(&Data::Int(3), false),
                spreadsheet_cell(&Data::Float(1.5), false),
                spreadsheet_cell(&Data::Int(12), true),
                spreadsheet_cell(&Data::String("H".to_string()), false),
            ],
            vec![
                spreadsheet_cell(&Data::Int(4), false),
                spreadsheet_cell(&Data::Float(0.25), false),
                spreadsheet_cell(&Data::Int(2), true),
                spreadsheet_cell(&Data::String("L".to_string()), false),
            ],
        ];
        let derived = clean_and_engineer(Table::from_rows(headers, rows));

        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache.csv");
        save_processed(&derived, &cache).unwrap();
        assert_eq!(load_processed(&cache).unwrap(), derived);
    }

    #[test]
    fn test_load_processed_missing_cache() {
        let dir = TempDir::new().unwrap();
        let err = load_processed(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataError::CacheMissing(_)));
    }
}

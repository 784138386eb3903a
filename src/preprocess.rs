//! Cleaning and feature engineering
//!
//! [`clean_and_engineer`] turns the raw export into the derived table in four
//! steps. Each step consumes the table and hands back a new one, and each is
//! skipped when its input columns are absent:
//!
//! 1. text normalization
//! 2. numeric coercion of the behavioral counts
//! 3. engagement score (per-column min-max, averaged, scaled to 0-100)
//! 4. performance class ordering and its ordinal code
//!
//! The min-max scale is taken over whatever rows are in the table, so the
//! pipeline runs once over the full dataset before any filtering.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::metrics::round_to;
use crate::table::{columns, Cell, ClassOrdinal, Table};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static regex");
}

/// Columns that are title-cased for display consistency
const TITLE_CASED: [&str; 4] = [
    columns::NATIONALITY,
    columns::PLACE_OF_BIRTH,
    columns::PARENT_SURVEY,
    columns::PARENT_SATISFACTION,
];

/// Run the full pipeline over a raw table
pub fn clean_and_engineer(raw: Table) -> Table {
    let rows = raw.len();
    let table = standardize_text(raw);
    let table = coerce_numeric(table);
    let table = engagement_score(table);
    let table = class_order(table);
    debug!(rows, columns = table.headers().len(), "derived table ready");
    table
}

// =============================================================================
// Step 1: text
// =============================================================================

/// Trim and collapse whitespace in every categorical column, title-case the
/// place and parent-survey columns, and canonicalize the absence buckets
pub fn standardize_text(table: Table) -> Table {
    let mut table = table;
    for name in columns::CATEGORICAL {
        if table.has_column(name) {
            table = table.map_column(name, normalize_cell);
        }
    }
    for name in TITLE_CASED {
        table = table.map_column(name, |cell| match cell {
            Cell::Text(s) => Cell::text(title_case(&s)),
            other => other,
        });
    }
    table = table.map_column(columns::ABSENCE_DAYS, |cell| match cell {
        Cell::Text(s) => Cell::text(canonical_absence(&s)),
        other => other,
    });
    debug!("text normalized");
    table
}

fn normalize_cell(cell: Cell) -> Cell {
    match cell {
        Cell::Text(s) => Cell::text(collapse_whitespace(&s)),
        // Spreadsheet input can hand us numbers in text columns
        Cell::Number(n) => Cell::text(n.to_string()),
        Cell::Missing => Cell::Missing,
    }
}

/// Trim both ends and squeeze internal whitespace runs to one space
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// A word starts at any letter that does not follow another letter, so
/// `"o'neil"` becomes `"O'Neil"` and `"saudi-arabia"` becomes `"Saudi-Arabia"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Map any spelling of the two absence buckets onto `Under_7` / `Above_7`.
/// Other values are returned unchanged.
pub fn canonical_absence(value: &str) -> String {
    let key: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect();
    match key.as_str() {
        "under7" => "Under_7".to_string(),
        "above7" => "Above_7".to_string(),
        _ => value.to_string(),
    }
}

// =============================================================================
// Step 2: numbers
// =============================================================================

/// Convert the behavioral columns to numbers. Unparseable, negative and
/// non-finite values become missing.
pub fn coerce_numeric(table: Table) -> Table {
    let mut table = table;
    for name in columns::BEHAVIORAL {
        table = table.map_column(name, coerce_cell);
    }
    debug!("behavioral columns coerced");
    table
}

fn coerce_cell(cell: Cell) -> Cell {
    let value = match cell {
        Cell::Number(n) => Some(n),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        Cell::Missing => None,
    };
    match value {
        Some(n) if n.is_finite() && n >= 0.0 => Cell::Number(n),
        _ => Cell::Missing,
    }
}

// =============================================================================
// Step 3: engagement score
// =============================================================================

/// Min-max scale values to [0, 1] against their own range.
///
/// A zero range, or a column with no values at all, scales to 0 everywhere,
/// missing entries included. Otherwise missing entries stay missing.
pub fn min_max_scale(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let bounds = values.iter().flatten().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(match acc {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        })
    });
    match bounds {
        Some((lo, hi)) if hi > lo => {
            let range = hi - lo;
            values.iter().map(|v| v.map(|v| (v - lo) / range)).collect()
        }
        _ => vec![Some(0.0); values.len()],
    }
}

/// Append `engagement_score`: the mean of the scaled behavioral columns
/// present in the table, times 100, rounded to 2 decimals
pub fn engagement_score(table: Table) -> Table {
    let scaled: Vec<Vec<Option<f64>>> = columns::BEHAVIORAL
        .iter()
        .filter_map(|name| table.numbers(name))
        .map(|values| min_max_scale(&values))
        .collect();

    let scores: Vec<Cell> = if scaled.is_empty() {
        debug!("no behavioral columns; engagement score undefined");
        vec![Cell::Missing; table.len()]
    } else {
        (0..table.len())
            .map(|row| {
                let present: Vec<f64> = scaled.iter().filter_map(|col| col[row]).collect();
                if present.is_empty() {
                    Cell::Missing
                } else {
                    let mean = present.iter().sum::<f64>() / present.len() as f64;
                    Cell::Number(round_to(mean * 100.0, 2))
                }
            })
            .collect()
    };
    debug!(used_columns = scaled.len(), "engagement score derived");
    table.with_column(columns::ENGAGEMENT_SCORE, scores)
}

// =============================================================================
// Step 4: class order
// =============================================================================

/// Canonicalize recognized class labels to `L`/`M`/`H` and append
/// `class_ordinal` (0, 1, 2, or -1 for anything else)
pub fn class_order(table: Table) -> Table {
    if !table.has_column(columns::CLASS) {
        return table;
    }
    let table = table.map_column(columns::CLASS, |cell| match ClassOrdinal::from_label(cell.as_text()) {
        ClassOrdinal::Known(class) => Cell::text(class.label()),
        ClassOrdinal::Unrecognized => cell,
    });
    let codes: Vec<Cell> = table
        .cells(columns::CLASS)
        .map(|cells| {
            cells
                .map(|c| Cell::Number(f64::from(ClassOrdinal::from_label(c.as_text()).code())))
                .collect()
        })
        .unwrap_or_default();
    table.with_column(columns::CLASS_ORDINAL, codes)
}

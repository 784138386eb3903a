//! In-memory student table
//!
//! A [`Table`] is a header list plus rows of [`Cell`]s. Columns the dashboard
//! knows about are named in [`columns`]; anything else in the source file is
//! carried through untouched so the cache mirrors the raw layout.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Column names as they appear in the xAPI-Edu-Data export
pub mod columns {
    pub const GENDER: &str = "gender";
    pub const NATIONALITY: &str = "NationalITy";
    pub const PLACE_OF_BIRTH: &str = "PlaceofBirth";
    pub const STAGE: &str = "StageID";
    pub const GRADE: &str = "GradeID";
    pub const SECTION: &str = "SectionID";
    pub const TOPIC: &str = "Topic";
    pub const SEMESTER: &str = "Semester";
    pub const RELATION: &str = "Relation";
    pub const PARENT_SURVEY: &str = "ParentAnsweringSurvey";
    pub const PARENT_SATISFACTION: &str = "ParentschoolSatisfaction";
    pub const ABSENCE_DAYS: &str = "StudentAbsenceDays";
    pub const CLASS: &str = "Class";

    pub const RAISED_HANDS: &str = "raisedhands";
    pub const VISITED_RESOURCES: &str = "VisITedResources";
    pub const ANNOUNCEMENTS_VIEW: &str = "AnnouncementsView";
    pub const DISCUSSION: &str = "Discussion";

    pub const ENGAGEMENT_SCORE: &str = "engagement_score";
    pub const CLASS_ORDINAL: &str = "class_ordinal";

    /// Text columns that get whitespace normalization
    pub const CATEGORICAL: [&str; 13] = [
        GENDER,
        NATIONALITY,
        PLACE_OF_BIRTH,
        STAGE,
        GRADE,
        SECTION,
        TOPIC,
        SEMESTER,
        RELATION,
        PARENT_SURVEY,
        PARENT_SATISFACTION,
        ABSENCE_DAYS,
        CLASS,
    ];

    /// The four raw interaction counts
    pub const BEHAVIORAL: [&str; 4] = [RAISED_HANDS, VISITED_RESOURCES, ANNOUNCEMENTS_VIEW, DISCUSSION];

    /// Columns stored as numbers in the processed cache
    pub const NUMERIC: [&str; 6] = [
        RAISED_HANDS,
        VISITED_RESOURCES,
        ANNOUNCEMENTS_VIEW,
        DISCUSSION,
        ENGAGEMENT_SCORE,
        CLASS_ORDINAL,
    ];

    pub fn is_numeric(name: &str) -> bool {
        NUMERIC.contains(&name)
    }
}

/// A single table value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Build a text cell, mapping an empty string to `Missing`
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(value)
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Performance bucket, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PerformanceClass {
    Low,
    Medium,
    High,
}

impl PerformanceClass {
    pub const ALL: [PerformanceClass; 3] = [Self::Low, Self::Medium, Self::High];

    /// Recognize `L`/`M`/`H` or `Low`/`Medium`/`High`, ignoring case
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Some(Self::Low),
            "m" | "medium" => Some(Self::Medium),
            "h" | "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Canonical label stored in the `Class` column
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "L",
            Self::Medium => "M",
            Self::High => "H",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for PerformanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordinal code of a performance class.
///
/// Values outside the three buckets are `Unrecognized`, never 0, 1 or 2.
/// They sort after `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassOrdinal {
    Known(PerformanceClass),
    Unrecognized,
}

impl ClassOrdinal {
    /// Value written to the `class_ordinal` column for unrecognized classes
    pub const UNRECOGNIZED_CODE: i8 = -1;

    pub fn from_label(label: Option<&str>) -> Self {
        match label.and_then(PerformanceClass::parse) {
            Some(class) => Self::Known(class),
            None => Self::Unrecognized,
        }
    }

    pub fn from_cell(cell: &Cell) -> Option<Self> {
        let code = cell.as_number()?;
        if code.fract() != 0.0 {
            return Some(Self::Unrecognized);
        }
        Some(match PerformanceClass::from_code(code as i64) {
            Some(class) => Self::Known(class),
            None => Self::Unrecognized,
        })
    }

    pub fn code(self) -> i8 {
        match self {
            Self::Known(class) => class.code() as i8,
            Self::Unrecognized => Self::UNRECOGNIZED_CODE,
        }
    }

    pub fn class(self) -> Option<PerformanceClass> {
        match self {
            Self::Known(class) => Some(class),
            Self::Unrecognized => None,
        }
    }
}

/// Rows of cells under a shared header
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table, padding short rows with `Missing` and truncating long ones
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Missing);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Missing);
        self.rows.push(row);
    }

    /// Cells of one column, or `None` if the column is absent
    pub fn cells(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Numeric view of a column; non-numeric cells read as `None`
    pub fn numbers(&self, name: &str) -> Option<Vec<Option<f64>>> {
        Some(self.cells(name)?.map(Cell::as_number).collect())
    }

    /// Text view of a column; non-text cells read as `None`
    pub fn texts(&self, name: &str) -> Option<Vec<Option<&str>>> {
        Some(self.cells(name)?.map(Cell::as_text).collect())
    }

    /// Ordinal codes from the `class_ordinal` column
    pub fn class_ordinals(&self) -> Option<Vec<Option<ClassOrdinal>>> {
        Some(
            self.cells(columns::CLASS_ORDINAL)?
                .map(ClassOrdinal::from_cell)
                .collect(),
        )
    }

    /// Rewrite every cell of a column. No-op if the column is absent.
    pub fn map_column(mut self, name: &str, mut f: impl FnMut(Cell) -> Cell) -> Self {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                let cell = std::mem::replace(&mut row[idx], Cell::Missing);
                row[idx] = f(cell);
            }
        }
        self
    }

    /// Replace a column's values, appending the column if it does not exist
    pub fn with_column(mut self, name: &str, values: Vec<Cell>) -> Self {
        debug_assert_eq!(values.len(), self.rows.len());
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Cell::Missing);
                }
                self.headers.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        self
    }

    /// Copy of the rows for which `keep` returns true
    pub fn filter_rows(&self, mut keep: impl FnMut(&[Cell]) -> bool) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Copy of the first `n` rows
    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Copy sorted by `class_ordinal` (Low, Medium, High, then unrecognized).
    /// The sort is stable; rows without a code go last.
    pub fn sorted_by_class(&self) -> Table {
        let Some(idx) = self.column_index(columns::CLASS_ORDINAL) else {
            return self.clone();
        };
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            match (ClassOrdinal::from_cell(&a[idx]), ClassOrdinal::from_cell(&b[idx])) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        Table {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Sorted distinct non-missing text values of a column
    pub fn distinct(&self, name: &str) -> Vec<String> {
        let mut values: Vec<String> = match self.cells(name) {
            Some(cells) => cells.filter_map(|c| c.as_text().map(str::to_string)).collect(),
            None => return Vec::new(),
        };
        values.sort();
        values.dedup();
        values
    }
}

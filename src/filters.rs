//! Multi-select filter state
//!
//! One [`Filter`] per categorical field present in the table. Every option
//! starts selected; [`FilterState::reset`] puts them all back. Applying the
//! state copies matching rows out of the base table and never touches it.

use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::preprocess::{canonical_absence, collapse_whitespace};
use crate::table::{columns, Cell, PerformanceClass, Table};

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("unknown filter '{0}' (expected one of: {})", FilterField::ALL.map(FilterField::key).join(", "))]
    UnknownField(String),

    #[error("filter '{0}' needs the form FIELD=VALUE")]
    Malformed(String),
}

/// The categorical columns exposed as filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FilterField {
    Stage,
    Grade,
    Topic,
    Semester,
    Gender,
    Class,
    AbsenceDays,
    Relation,
}

impl FilterField {
    pub const ALL: [FilterField; 8] = [
        Self::Stage,
        Self::Grade,
        Self::Topic,
        Self::Semester,
        Self::Gender,
        Self::Class,
        Self::AbsenceDays,
        Self::Relation,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Self::Stage => columns::STAGE,
            Self::Grade => columns::GRADE,
            Self::Topic => columns::TOPIC,
            Self::Semester => columns::SEMESTER,
            Self::Gender => columns::GENDER,
            Self::Class => columns::CLASS,
            Self::AbsenceDays => columns::ABSENCE_DAYS,
            Self::Relation => columns::RELATION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stage => "Stage",
            Self::Grade => "Grade",
            Self::Topic => "Topic",
            Self::Semester => "Semester",
            Self::Gender => "Gender",
            Self::Class => "Performance Class",
            Self::AbsenceDays => "Absence Days",
            Self::Relation => "Parent Relation",
        }
    }

    /// Short name used on the command line and in query strings
    pub fn key(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Grade => "grade",
            Self::Topic => "topic",
            Self::Semester => "semester",
            Self::Gender => "gender",
            Self::Class => "class",
            Self::AbsenceDays => "absence",
            Self::Relation => "relation",
        }
    }

    /// Accepts the short key or the column header, ignoring case
    pub fn parse(name: &str) -> Result<Self, FilterError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(name) || f.column().eq_ignore_ascii_case(name))
            .ok_or_else(|| FilterError::UnknownField(name.to_string()))
    }

    /// Spell a user-supplied value the way the cleaned column stores it
    pub fn canonical_value(self, value: &str) -> String {
        let value = collapse_whitespace(value);
        match self {
            Self::AbsenceDays => canonical_absence(&value),
            Self::Class => PerformanceClass::parse(&value).map_or(value, |c| c.label().to_string()),
            _ => value,
        }
    }
}

/// Options and current selection for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub field: FilterField,
    pub options: Vec<String>,
    pub selected: BTreeSet<String>,
}

impl Filter {
    pub fn is_all_selected(&self) -> bool {
        self.options.iter().all(|o| self.selected.contains(o))
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }
}

/// Selected values per filter, resettable to "everything selected"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    filters: Vec<Filter>,
    /// Bumped on every reset
    generation: u64,
}

impl FilterState {
    /// One filter per field whose column is in the table, all options selected
    pub fn from_table(table: &Table) -> Self {
        let filters = FilterField::ALL
            .into_iter()
            .filter(|f| table.has_column(f.column()))
            .map(|field| {
                let options = options_for(table, field);
                Filter {
                    field,
                    selected: options.iter().cloned().collect(),
                    options,
                }
            })
            .collect();
        Self {
            filters,
            generation: 0,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn filter(&self, field: FilterField) -> Option<&Filter> {
        self.filters.iter().find(|f| f.field == field)
    }

    fn filter_mut(&mut self, field: FilterField) -> Option<&mut Filter> {
        self.filters.iter_mut().find(|f| f.field == field)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_all_selected(&self) -> bool {
        self.filters.iter().all(Filter::is_all_selected)
    }

    /// Flip one option. Returns whether it is now selected.
    pub fn toggle(&mut self, field: FilterField, value: &str) -> bool {
        let Some(filter) = self.filter_mut(field) else {
            return false;
        };
        if filter.selected.remove(value) {
            false
        } else {
            filter.selected.insert(value.to_string());
            true
        }
    }

    /// Select exactly `values` for a field
    pub fn select_only<S: AsRef<str>>(&mut self, field: FilterField, values: &[S]) {
        if let Some(filter) = self.filter_mut(field) {
            filter.selected = values.iter().map(|v| v.as_ref().to_string()).collect();
        }
    }

    pub fn select_all(&mut self, field: FilterField) {
        if let Some(filter) = self.filter_mut(field) {
            filter.selected = filter.options.iter().cloned().collect();
        }
    }

    pub fn clear(&mut self, field: FilterField) {
        if let Some(filter) = self.filter_mut(field) {
            filter.selected.clear();
        }
    }

    /// Restore every filter to all options selected
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.selected = filter.options.iter().cloned().collect();
        }
        self.generation += 1;
    }

    /// Narrow the state from `(field, value)` pairs such as a query string.
    /// Fields that appear are restricted to the listed values; others stay as they are.
    /// Values are normalized the way the preprocessor normalizes the column, and
    /// an empty value selects nothing.
    pub fn restrict<K: AsRef<str>, V: AsRef<str>>(&mut self, pairs: &[(K, V)]) -> Result<(), FilterError> {
        let mut grouped: Vec<(FilterField, Vec<&str>)> = Vec::new();
        for (key, value) in pairs {
            let field = FilterField::parse(key.as_ref())?;
            match grouped.iter_mut().find(|(f, _)| *f == field) {
                Some((_, values)) => values.push(value.as_ref()),
                None => grouped.push((field, vec![value.as_ref()])),
            }
        }
        for (field, values) in grouped {
            let values: Vec<String> = values
                .into_iter()
                .map(|v| field.canonical_value(v))
                .filter(|v| !v.is_empty())
                .collect();
            self.select_only(field, &values);
        }
        Ok(())
    }

    /// Rows matching every filter. Filters with all options selected are skipped,
    /// so a fully selected state returns the table unchanged.
    pub fn apply(&self, table: &Table) -> Table {
        let active: Vec<(usize, &Filter)> = self
            .filters
            .iter()
            .filter(|f| !f.is_all_selected())
            .filter_map(|f| table.column_index(f.field.column()).map(|idx| (idx, f)))
            .collect();
        if active.is_empty() {
            return table.clone();
        }
        table.filter_rows(|row| {
            active.iter().all(|(idx, filter)| match &row[*idx] {
                Cell::Text(value) => filter.is_selected(value),
                _ => false,
            })
        })
    }
}

/// Parse `FIELD=VALUE` arguments
pub fn parse_filter_args(args: &[String]) -> Result<Vec<(String, String)>, FilterError> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| FilterError::Malformed(arg.clone()))
        })
        .collect()
}

/// Distinct values for a field. Performance classes follow Low < Medium < High.
fn options_for(table: &Table, field: FilterField) -> Vec<String> {
    let mut options = table.distinct(field.column());
    if field == FilterField::Class {
        options.sort_by_key(|label| (PerformanceClass::parse(label).map_or(u8::MAX, |c| c.code()), label.clone()));
    }
    options
}

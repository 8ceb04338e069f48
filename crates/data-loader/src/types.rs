//! Core domain types for the cinema ratings dataset.
//!
//! The dataset is a wide CSV (TMDB metadata plus a Letterboxd rating). Only
//! a handful of columns are touched by the recovery pipeline; those are
//! typed fields on [`Record`]. Everything else travels in a pass-through
//! bag so nothing is lost when a dataset is written back out.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases and Column Names
// =============================================================================

/// Unique identifier for a record (the TMDB id)
pub type RecordId = u64;

pub const ID_COLUMN: &str = "tmdb_id";
pub const TITLE_COLUMN: &str = "title";
pub const YEAR_COLUMN: &str = "year";
pub const GENRES_COLUMN: &str = "genres";
pub const RATING_COLUMN: &str = "lb_rating";
/// Written by the merger next to `lb_rating` to record where a value came from
pub const PROVENANCE_COLUMN: &str = "lb_rating_source";

/// Primary genre used for records whose genre cell is empty
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Inclusive bounds of a valid target rating
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

/// Returns the first entry of a comma-separated genre list, trimmed.
///
/// `None` when the list is absent or its first entry is blank.
pub fn primary_genre(genres: Option<&str>) -> Option<&str> {
    genres
        .and_then(|g| g.split(',').next())
        .map(str::trim)
        .filter(|g| !g.is_empty())
}

// =============================================================================
// Record Types
// =============================================================================

/// One row of the clean dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    /// Release year, `None` when the cell is empty
    pub year: Option<i32>,
    /// Raw comma-separated genre list, `None` when the cell is empty
    pub genres: Option<String>,
    /// Target rating in [0, 5], `None` when missing
    pub rating: Option<f64>,
    /// Every other column, keyed by header name
    pub extra: HashMap<String, String>,
}

impl Record {
    pub fn primary_genre(&self) -> Option<&str> {
        primary_genre(self.genres.as_deref())
    }

    /// Render the cell for `column` the way it is written to disk.
    pub fn field_value(&self, column: &str) -> String {
        match column {
            ID_COLUMN => self.id.to_string(),
            TITLE_COLUMN => self.title.clone(),
            YEAR_COLUMN => self.year.map(|y| y.to_string()).unwrap_or_default(),
            GENRES_COLUMN => self.genres.clone().unwrap_or_default(),
            RATING_COLUMN => self.rating.map(format_float).unwrap_or_default(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// A record queued for rating recovery. The year is required here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: RecordId,
    pub title: String,
    pub year: i32,
    pub genres: Option<String>,
}

impl AuditEntry {
    pub fn primary_genre(&self) -> Option<&str> {
        primary_genre(self.genres.as_deref())
    }
}

/// Format a float for output: integral values keep one
/// decimal place (`4.0`), everything else uses the shortest round-trip form.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

// =============================================================================
// Raw Table
// =============================================================================

/// Untyped view of a delimited file: a header row and string cells.
///
/// Validation and cleaning operate on this so they work on any schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over the cells of one column; empty when the column is absent.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        let idx = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| idx.map(|i| row.get(i).map(String::as_str).unwrap_or("")))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Dataset - keyed collection of records
// =============================================================================

/// The clean dataset held in memory, in file order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub(crate) headers: Vec<String>,
    pub(crate) records: Vec<Record>,
    pub(crate) by_id: HashMap<RecordId, usize>,
}

impl Dataset {
    /// Creates an empty dataset that will be written with `headers`
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.by_id.get(&id).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

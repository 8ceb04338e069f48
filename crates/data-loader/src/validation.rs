//! Data-quality report for any dataset file.
//!
//! Runs four families of checks over a raw [`Table`]:
//! 1. Schema integrity: every expected column is present
//! 2. Boundary checks: numeric columns stay inside their documented range
//! 3. Consistency: `profit == revenue - budget`
//! 4. Completeness: share of missing cells per column
//!
//! Checks never fail the load; the caller decides what to do with the report.

use crate::error::Result;
use crate::parser::{is_null_cell, parse_nullable_float, read_table};
use crate::types::Table;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Columns the collector produces
pub const EXPECTED_COLUMNS: &[&str] = &[
    "year",
    "title",
    "lb_rating",
    "tmdb_rating",
    "genres",
    "runtime_min",
    "budget",
    "revenue",
    "original_language",
    "production_companies",
    "imdb_id",
    "tmdb_id",
    "original_title",
    "tmdb_popularity",
    "vote_count",
    "release_date",
    "overview",
    "production_countries",
    "status",
    "tagline",
    "profit",
];

/// (column, min, max) inclusive ranges
const BOUNDARIES: &[(&str, f64, f64)] = &[
    ("lb_rating", 0.0, 5.0),
    ("tmdb_rating", 0.0, 10.0),
    ("year", 1945.0, 2025.0),
];

const PROFIT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Serialize)]
pub struct BoundaryCheck {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub outliers: usize,
}

impl BoundaryCheck {
    pub fn passed(&self) -> bool {
        self.outliers == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsistencyCheck {
    Passed,
    Failed { mismatches: usize },
    Skipped { missing: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnCompleteness {
    pub column: String,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub file: String,
    pub total_rows: usize,
    pub missing_columns: Vec<String>,
    pub boundaries: Vec<BoundaryCheck>,
    pub profit_consistency: ConsistencyCheck,
    pub completeness: Vec<ColumnCompleteness>,
}

impl ValidationReport {
    /// True when schema, boundary and consistency checks all pass.
    /// Completeness is informational.
    pub fn passed(&self) -> bool {
        self.missing_columns.is_empty()
            && self.boundaries.iter().all(BoundaryCheck::passed)
            && !matches!(self.profit_consistency, ConsistencyCheck::Failed { .. })
    }
}

/// Load `path` and validate it.
pub fn validate_file(path: &Path) -> Result<ValidationReport> {
    let table = read_table(path)?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(validate_table(&table, &file))
}

/// Run every check over an in-memory table.
pub fn validate_table(table: &Table, file: &str) -> ValidationReport {
    let missing_columns = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();

    let boundaries = BOUNDARIES
        .iter()
        .filter(|(column, _, _)| table.has_column(column))
        .map(|&(column, min, max)| BoundaryCheck {
            column: column.to_string(),
            min,
            max,
            outliers: table
                .column(column)
                .filter_map(parse_nullable_float)
                .filter(|v| *v < min || *v > max)
                .count(),
        })
        .collect();

    ValidationReport {
        file: file.to_string(),
        total_rows: table.len(),
        missing_columns,
        boundaries,
        profit_consistency: check_profit(table),
        completeness: completeness(table),
    }
}

fn check_profit(table: &Table) -> ConsistencyCheck {
    let columns = ["profit", "revenue", "budget"];
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return ConsistencyCheck::Skipped { missing };
    }

    let mismatches = table
        .column("profit")
        .zip(table.column("revenue"))
        .zip(table.column("budget"))
        .filter_map(|((p, r), b)| {
            Some((
                parse_nullable_float(p)?,
                parse_nullable_float(r)?,
                parse_nullable_float(b)?,
            ))
        })
        .filter(|(profit, revenue, budget)| (profit - (revenue - budget)).abs() > PROFIT_TOLERANCE)
        .count();

    if mismatches == 0 {
        ConsistencyCheck::Passed
    } else {
        ConsistencyCheck::Failed { mismatches }
    }
}

fn completeness(table: &Table) -> Vec<ColumnCompleteness> {
    let total = table.len();
    table
        .headers
        .par_iter()
        .map(|column| {
            let missing = table.column(column).filter(|c| is_null_cell(c)).count();
            let missing_pct = if total == 0 {
                0.0
            } else {
                missing as f64 * 100.0 / total as f64
            };
            ColumnCompleteness {
                column: column.clone(),
                missing_pct,
            }
        })
        .collect()
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Data Validation Report for {} ---", self.file)?;
        writeln!(f, "Total Rows: {}", self.total_rows)?;
        writeln!(f)?;

        if self.missing_columns.is_empty() {
            writeln!(f, "PASS Schema Integrity (all expected columns found)")?;
        } else {
            writeln!(
                f,
                "FAIL Schema Integrity (missing columns: {})",
                self.missing_columns.join(", ")
            )?;
        }

        writeln!(f, "\n--- Boundary Checks ---")?;
        for check in &self.boundaries {
            if check.passed() {
                writeln!(
                    f,
                    "PASS {} (all values within [{}, {}])",
                    check.column, check.min, check.max
                )?;
            } else {
                writeln!(
                    f,
                    "FAIL {} ({} values outside [{}, {}])",
                    check.column, check.outliers, check.min, check.max
                )?;
            }
        }

        writeln!(f, "\n--- Consistency Checks ---")?;
        match &self.profit_consistency {
            ConsistencyCheck::Passed => {
                writeln!(f, "PASS Profit Calculation (profit == revenue - budget)")?
            }
            ConsistencyCheck::Failed { mismatches } => writeln!(
                f,
                "FAIL Profit Calculation ({} rows have profit != revenue - budget)",
                mismatches
            )?,
            ConsistencyCheck::Skipped { missing } => writeln!(
                f,
                "SKIP Profit Calculation (missing columns: {})",
                missing.join(", ")
            )?,
        }

        writeln!(f, "\n--- Completeness (Missing Values %) ---")?;
        for column in &self.completeness {
            let marker = if column.missing_pct == 0.0 { "ok  " } else { "warn" };
            writeln!(f, "{} {}: {:.2}% missing", marker, column.column, column.missing_pct)?;
        }
        Ok(())
    }
}

//! Turns the raw collector export into the clean dataset.
//!
//! Operates on a raw [`Table`] so unknown columns pass through untouched:
//! - `lb_rating`: non-numeric values become empty
//! - `budget` / `revenue`: zero means unknown and becomes empty
//! - `release_date`: anything that is not a calendar date becomes empty
//! - `profit`: recomputed as `revenue - budget` (appended when absent)

use crate::config::CleanConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use data_loader::parser::{self, parse_nullable_float};
use data_loader::{format_float, Table, RATING_COLUMN, TITLE_COLUMN, YEAR_COLUMN};
use std::cmp::Ordering;
use std::fmt;
use tracing::info;

pub const BUDGET_COLUMN: &str = "budget";
pub const REVENUE_COLUMN: &str = "revenue";
pub const PROFIT_COLUMN: &str = "profit";
pub const RELEASE_DATE_COLUMN: &str = "release_date";

const TOP_PROFITABLE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfitableMovie {
    pub title: String,
    pub year: String,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanSummary {
    pub total: usize,
    pub rated: usize,
    pub average_rating: Option<f64>,
    pub top_profitable: Vec<ProfitableMovie>,
}

impl fmt::Display for CleanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Summary Stats ---")?;
        writeln!(f, "Total Movies: {}", self.total)?;
        writeln!(f, "Movies with LB Ratings: {}", self.rated)?;
        match self.average_rating {
            Some(avg) => writeln!(f, "Average LB Rating: {:.2}", avg)?,
            None => writeln!(f, "Average LB Rating: n/a")?,
        }
        writeln!(f, "\n--- Top {} Profitable Movies ---", TOP_PROFITABLE)?;
        for movie in &self.top_profitable {
            writeln!(f, "{} ({}) {:.0}", movie.title, movie.year, movie.profit)?;
        }
        Ok(())
    }
}

/// Normalise a release date to `YYYY-MM-DD`; a time suffix is dropped.
fn clean_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn map_column(table: &mut Table, column: &str, f: impl Fn(&str) -> String) {
    let Some(idx) = table.column_index(column) else {
        return;
    };
    for row in &mut table.rows {
        if let Some(cell) = row.get_mut(idx) {
            *cell = f(cell);
        }
    }
}

fn zero_to_empty(raw: &str) -> String {
    match parse_nullable_float(raw) {
        Some(v) if v == 0.0 => String::new(),
        _ => raw.to_string(),
    }
}

/// Apply every cleaning rule and compute the summary.
pub fn clean_table(mut table: Table) -> (Table, CleanSummary) {
    map_column(&mut table, RATING_COLUMN, |raw| {
        parse_nullable_float(raw).map(format_float).unwrap_or_default()
    });
    map_column(&mut table, BUDGET_COLUMN, zero_to_empty);
    map_column(&mut table, REVENUE_COLUMN, zero_to_empty);
    map_column(&mut table, RELEASE_DATE_COLUMN, |raw| {
        clean_date(raw).unwrap_or_default()
    });

    if let (Some(budget), Some(revenue)) = (
        table.column_index(BUDGET_COLUMN),
        table.column_index(REVENUE_COLUMN),
    ) {
        let profit_idx = match table.column_index(PROFIT_COLUMN) {
            Some(idx) => idx,
            None => {
                table.headers.push(PROFIT_COLUMN.to_string());
                table.headers.len() - 1
            }
        };
        for row in &mut table.rows {
            row.resize(row.len().max(table.headers.len()), String::new());
            let profit = match (
                parse_nullable_float(&row[revenue]),
                parse_nullable_float(&row[budget]),
            ) {
                (Some(r), Some(b)) => format_float(r - b),
                _ => String::new(),
            };
            row[profit_idx] = profit;
        }
    }

    let summary = summarize(&table);
    (table, summary)
}

fn summarize(table: &Table) -> CleanSummary {
    let ratings: Vec<f64> = table
        .column(RATING_COLUMN)
        .filter_map(parse_nullable_float)
        .collect();
    let average_rating =
        (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

    let mut profitable: Vec<ProfitableMovie> = table
        .column(TITLE_COLUMN)
        .zip(table.column(YEAR_COLUMN))
        .zip(table.column(PROFIT_COLUMN))
        .filter_map(|((title, year), profit)| {
            Some(ProfitableMovie {
                title: title.to_string(),
                year: year.to_string(),
                profit: parse_nullable_float(profit)?,
            })
        })
        .collect();
    profitable.sort_by(|a, b| b.profit.partial_cmp(&a.profit).unwrap_or(Ordering::Equal));
    profitable.truncate(TOP_PROFITABLE);

    CleanSummary {
        total: table.len(),
        rated: ratings.len(),
        average_rating,
        top_profitable: profitable,
    }
}

/// Run the cleaning stage end to end.
pub fn run_clean(config: &CleanConfig) -> Result<CleanSummary> {
    config.check()?;
    let table = parser::read_table(&config.raw_path)
        .with_context(|| format!("Failed to load {}", config.raw_path.display()))?;
    info!("Loaded {} raw rows from {}", table.len(), config.raw_path.display());

    let (cleaned, summary) = clean_table(table);
    parser::write_table(&config.output_path, &cleaned)
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;
    info!("Cleaned data saved to {}", config.output_path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_table() -> Table {
        let headers = ["title", "year", "lb_rating", "budget", "revenue", "release_date"];
        let rows: &[[&str; 6]] = &[
            ["Godzilla", "1954", "3.7", "1000000", "2250000", "1954-11-03"],
            ["Hausu", "1977", "n/a", "0", "500000", "1977-07-30 00:00:00"],
            ["Symbol", "2009", "", "200", "0", "unknown"],
        ];
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_clean_rules() {
        let (table, _) = clean_table(raw_table());

        assert_eq!(table.headers.last().map(String::as_str), Some("profit"));
        let ratings: Vec<_> = table.column("lb_rating").collect();
        assert_eq!(ratings, vec!["3.7", "", ""]);
        let budgets: Vec<_> = table.column("budget").collect();
        assert_eq!(budgets, vec!["1000000", "", "200"]);
        let revenues: Vec<_> = table.column("revenue").collect();
        assert_eq!(revenues, vec!["2250000", "500000", ""]);
        let dates: Vec<_> = table.column("release_date").collect();
        assert_eq!(dates, vec!["1954-11-03", "1977-07-30", ""]);
        let profits: Vec<_> = table.column("profit").collect();
        assert_eq!(profits, vec!["1250000.0", "", ""]);
    }

    #[test]
    fn test_summary() {
        let (_, summary) = clean_table(raw_table());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.rated, 1);
        assert_eq!(summary.average_rating, Some(3.7));
        assert_eq!(summary.top_profitable.len(), 1);
        assert_eq!(summary.top_profitable[0].title, "Godzilla");
    }

    #[test]
    fn test_existing_profit_column_is_recomputed() {
        let table = Table {
            headers: vec!["budget".into(), "profit".into(), "revenue".into()],
            rows: vec![vec!["10".into(), "999".into(), "15".into()]],
        };
        let (table, _) = clean_table(table);
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows[0][1], "5.0");
    }

    #[test]
    fn test_run_clean_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = CleanConfig {
            raw_path: dir.path().join("raw.csv"),
            output_path: dir.path().join("clean.csv"),
        };
        std::fs::write(&config.raw_path, "title,lb_rating\nA,4.5\nB,x\n").unwrap();

        let summary = run_clean(&config).unwrap();
        assert_eq!(summary.rated, 1);
        let written = std::fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(written, "title,lb_rating\nA,4.5\nB,\n");
    }
}

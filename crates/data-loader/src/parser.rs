//! Reading and writing the comma-delimited dataset files.
//!
//! Files are read into a raw [`Table`] first, then typed columns are parsed
//! out of it. Parsing is tolerant of the exports the collector produces:
//! empty and `NaN`-like cells are null, integer columns accept integral
//! floats (`"1995.0"`), and non-numeric ratings are coerced to null.
//!
//! Writes go through a temporary file in the destination directory that is
//! renamed into place, so a reader never sees a half-written output.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Cell spellings read as a missing value
const NULL_MARKERS: &[&str] = &["", "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "NULL", "null", "None", "<NA>", "#N/A"];

/// True when a cell holds no value.
pub fn is_null_cell(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell.trim())
}

/// Parse an integer that may have been written as an integral float.
///
/// Example: "1995" -> Some(1995), "1995.0" -> Some(1995), "1995.5" -> None
pub fn parse_integer_like(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse a nullable float; null markers and non-numeric text become `None`.
pub fn parse_nullable_float(cell: &str) -> Option<f64> {
    if is_null_cell(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn file_label(path: &Path) -> String {
    path.display().to_string()
}

fn csv_error(path: &Path, source: csv::Error) -> DataLoadError {
    DataLoadError::CsvError {
        file: file_label(path),
        source,
    }
}

/// Read a delimited file into a raw [`Table`].
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: file_label(path),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(headers);
    for result in reader.records() {
        let row = result.map_err(|e| csv_error(path, e))?;
        table.rows.push(row.iter().map(str::to_string).collect());
    }

    debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Write a [`Table`] to `path` atomically.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staging = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(staging.as_file_mut());
        writer
            .write_record(&table.headers)
            .map_err(|e| csv_error(path, e))?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| csv_error(path, e))?;
        }
        writer.flush()?;
    }
    staging.as_file_mut().flush()?;
    staging
        .persist(path)
        .map_err(|e| DataLoadError::IoError(e.error))?;

    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

// =============================================================================
// Typed parsing
// =============================================================================

/// Column positions resolved once per file
struct Columns {
    id: usize,
    title: usize,
    year: usize,
    genres: Option<usize>,
    rating: Option<usize>,
}

fn require_column(table: &Table, file: &str, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| DataLoadError::MissingColumn {
            file: file.to_string(),
            column: name.to_string(),
        })
}

fn resolve_columns(table: &Table, file: &str, rating_required: bool) -> Result<Columns> {
    let rating = if rating_required {
        Some(require_column(table, file, RATING_COLUMN)?)
    } else {
        table.column_index(RATING_COLUMN)
    };
    Ok(Columns {
        id: require_column(table, file, ID_COLUMN)?,
        title: require_column(table, file, TITLE_COLUMN)?,
        year: require_column(table, file, YEAR_COLUMN)?,
        genres: table.column_index(GENRES_COLUMN),
        rating,
    })
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Line number of a data row; the header is line 1.
fn line_of(row_idx: usize) -> usize {
    row_idx + 2
}

fn parse_id(row: &[String], cols: &Columns, file: &str, line: usize) -> Result<RecordId> {
    let raw = cell(row, cols.id);
    parse_integer_like(raw)
        .and_then(|id| RecordId::try_from(id).ok())
        .ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("Invalid {}: '{}'", ID_COLUMN, raw),
        })
}

fn parse_year(row: &[String], cols: &Columns, file: &str, line: usize) -> Result<i32> {
    let raw = cell(row, cols.year);
    parse_integer_like(raw)
        .and_then(|year| i32::try_from(year).ok())
        .ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("Invalid {}: '{}'", YEAR_COLUMN, raw),
        })
}

/// Year of a dataset row; an empty cell is `None`, anything else unparseable is an error.
fn parse_nullable_year(
    row: &[String],
    cols: &Columns,
    file: &str,
    line: usize,
) -> Result<Option<i32>> {
    if is_null_cell(cell(row, cols.year)) {
        return Ok(None);
    }
    parse_year(row, cols, file, line).map(Some)
}

fn parse_genres(row: &[String], cols: &Columns) -> Option<String> {
    cols.genres
        .map(|idx| cell(row, idx))
        .filter(|raw| !is_null_cell(raw))
        .map(str::to_string)
}

fn parse_rating(row: &[String], cols: &Columns, file: &str, line: usize) -> Result<Option<f64>> {
    let Some(idx) = cols.rating else {
        return Ok(None);
    };
    let raw = cell(row, idx);
    let rating = parse_nullable_float(raw);
    if rating.is_none() && !is_null_cell(raw) {
        debug!("{}:{} coerced non-numeric rating '{}' to null", file, line, raw);
    }
    match rating {
        Some(value) if !(MIN_RATING..=MAX_RATING).contains(&value) => {
            Err(DataLoadError::InvalidValue {
                field: RATING_COLUMN.to_string(),
                value: format!("{} (line {} in {})", raw, line, file),
            })
        }
        other => Ok(other),
    }
}

/// Build a [`Dataset`] from a raw table of the clean dataset.
pub fn parse_records(table: &Table, file: &str) -> Result<Dataset> {
    let cols = resolve_columns(table, file, true)?;
    let typed = [Some(cols.id), Some(cols.title), Some(cols.year), cols.genres, cols.rating];

    let mut dataset = Dataset::new(table.headers.clone());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let line = line_of(row_idx);
        let extra = table
            .headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| !typed.contains(&Some(*idx)))
            .map(|(idx, name)| (name.clone(), cell(row, idx).to_string()))
            .collect();

        let record = Record {
            id: parse_id(row, &cols, file, line)?,
            title: cell(row, cols.title).to_string(),
            year: parse_nullable_year(row, &cols, file, line)?,
            genres: parse_genres(row, &cols),
            rating: parse_rating(row, &cols, file, line)?,
            extra,
        };
        dataset.insert_record(record)?;
    }
    Ok(dataset)
}

/// Parse audit entries out of a raw table of the audit file.
pub fn parse_audit_entries(table: &Table, file: &str) -> Result<Vec<AuditEntry>> {
    let cols = resolve_columns(table, file, false)?;
    let mut entries = Vec::with_capacity(table.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let line = line_of(row_idx);
        entries.push(AuditEntry {
            id: parse_id(row, &cols, file, line)?,
            title: cell(row, cols.title).to_string(),
            year: parse_year(row, &cols, file, line)?,
            genres: parse_genres(row, &cols),
        });
    }
    Ok(entries)
}

/// Collect the identifier column of any table.
pub fn parse_id_set(table: &Table, file: &str) -> Result<HashSet<RecordId>> {
    let idx = require_column(table, file, ID_COLUMN)?;
    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let raw = cell(row, idx);
            parse_integer_like(raw)
                .and_then(|id| RecordId::try_from(id).ok())
                .ok_or_else(|| DataLoadError::ParseError {
                    file: file.to_string(),
                    line: line_of(row_idx),
                    reason: format!("Invalid {}: '{}'", ID_COLUMN, raw),
                })
        })
        .collect()
}

/// Load the audit list from disk.
pub fn load_audit_entries(path: &Path) -> Result<Vec<AuditEntry>> {
    let table = read_table(path)?;
    parse_audit_entries(&table, &file_label(path))
}

/// Render a dataset as a raw table using its own header order.
pub fn dataset_to_table(dataset: &Dataset) -> Table {
    project_records(dataset.records(), dataset.headers())
}

/// Render records onto an arbitrary set of columns.
pub fn project_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    headers: &[String],
) -> Table {
    let mut table = Table::new(headers.to_vec());
    table.rows = records
        .into_iter()
        .map(|record| headers.iter().map(|h| record.field_value(h)).collect())
        .collect();
    table
}

/// Write a dataset to disk atomically.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    write_table(path, &dataset_to_table(dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(csv_text: &str) -> Table {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", csv_text).unwrap();
        read_table(file.path()).unwrap()
    }

    #[test]
    fn test_integer_like() {
        assert_eq!(parse_integer_like("1995"), Some(1995));
        assert_eq!(parse_integer_like(" 1995.0 "), Some(1995));
        assert_eq!(parse_integer_like("1995.5"), None);
        assert_eq!(parse_integer_like("nineteen"), None);
        assert_eq!(parse_integer_like(""), None);
    }

    #[test]
    fn test_nullable_float() {
        assert_eq!(parse_nullable_float("3.85"), Some(3.85));
        assert_eq!(parse_nullable_float(""), None);
        assert_eq!(parse_nullable_float("NaN"), None);
        assert_eq!(parse_nullable_float("n/a"), None);
        assert_eq!(parse_nullable_float("unrated"), None);
    }

    #[test]
    fn test_parse_records_keeps_extra_columns() {
        let table = table(
            "year,title,lb_rating,genres,tmdb_id,overview\n\
             1997,Cure,3.9,\"Crime, Thriller\",36095,A detective\n\
             2003,Oldboy,,Drama,670,\n",
        );
        let dataset = parse_records(&table, "clean.csv").unwrap();

        assert_eq!(dataset.len(), 2);
        let cure = dataset.get(36095).unwrap();
        assert_eq!(cure.year, Some(1997));
        assert_eq!(cure.rating, Some(3.9));
        assert_eq!(cure.primary_genre(), Some("Crime"));
        assert_eq!(cure.extra.get("overview").map(String::as_str), Some("A detective"));
        assert!(!cure.extra.contains_key("title"));

        let oldboy = dataset.get(670).unwrap();
        assert_eq!(oldboy.rating, None);
        assert_eq!(oldboy.extra.get("overview").map(String::as_str), Some(""));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = table("title,year,lb_rating\nCure,1997,3.9\n");
        let err = parse_records(&table, "clean.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "tmdb_id"));
    }

    #[test]
    fn test_bad_year_reports_line() {
        let table = table("tmdb_id,title,year,lb_rating\n1,A,1990,3.0\n2,B,soon,\n");
        let err = parse_records(&table, "clean.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_blank_year_is_tolerated_and_written_back_blank() {
        let source = "tmdb_id,title,year,genres,lb_rating\n\
                      1,A,1994,Drama,4.0\n\
                      3,Unreleased,,Drama,\n";
        let dataset = parse_records(&table(source), "clean.csv").unwrap();
        assert_eq!(dataset.get(3).unwrap().year, None);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        write_dataset(&out, &dataset).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), source);
    }

    #[test]
    fn test_audit_entries_require_year() {
        let table = table("tmdb_id,title,year\n3,Unreleased,\n");
        let err = parse_audit_entries(&table, "audit.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_out_of_range_rating_rejected() {
        let table = table("tmdb_id,title,year,lb_rating\n1,A,1990,7.5\n");
        let err = parse_records(&table, "clean.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let table = table("tmdb_id,title,year,lb_rating\n1,A,1990,3.0\n1.0,A again,1990,\n");
        let err = parse_records(&table, "clean.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateId { id: 1 }));
    }

    #[test]
    fn test_audit_entries_without_genres_column() {
        let table = table("tmdb_id,title,year,original_language\n670,Oldboy,2003.0,ko\n");
        let entries = parse_audit_entries(&table, "audit.csv").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].year, 2003);
        assert_eq!(entries[0].genres, None);
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_write_preserves_column_order() {
        let source = "title,tmdb_id,lb_rating,year,genres,overview\n\
                      Cure,36095,4.0,1997,Crime,\"Quoted, text\"\n\
                      Oldboy,670,,2003,,\n";
        let table = table(source);
        let dataset = parse_records(&table, "clean.csv").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.csv");
        write_dataset(&out, &dataset).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, source);
    }
}

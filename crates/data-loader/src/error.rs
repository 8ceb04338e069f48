//! Error types for the data-loader crate.
//!
//! Every failure that can happen while reading or writing the cinema
//! datasets is described by [`DataLoadError`]. Loading errors are fatal for
//! a batch run, so variants carry enough context (file, line, column) to
//! point at the offending cell.

use thiserror::Error;

use crate::types::RecordId;

/// Errors that can occur during data loading, parsing and writing
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Input file does not exist
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The delimited-text reader or writer rejected the file
    #[error("CSV error in {file}: {source}")]
    CsvError {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A row in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The same identifier appears on more than one row
    #[error("Duplicate identifier {id}")]
    DuplicateId { id: RecordId },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

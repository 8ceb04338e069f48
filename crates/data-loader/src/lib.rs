//! # Data Loader Crate
//!
//! This crate handles loading, indexing, validating and writing the Asian
//! cinema ratings dataset.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Record, AuditEntry, Dataset, Table)
//! - **parser**: Read and write CSV files, typed column parsing
//! - **index**: Keyed dataset operations used by the pipeline stages
//! - **validation**: Data-quality report over any dataset file
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Dataset, parser};
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_file(Path::new("data/asian_cinema_stats_CLEAN.csv"))?;
//! let audit = parser::load_audit_entries(Path::new("data/missing_ratings_audit.csv"))?;
//!
//! println!("{} records, {} queued for recovery", dataset.len(), audit.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod validation;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    RecordId,
    // Core types
    AuditEntry,
    Dataset,
    Record,
    Table,
    // Helpers
    format_float,
    primary_genre,
    // Column names and constants
    GENRES_COLUMN,
    ID_COLUMN,
    MAX_RATING,
    MIN_RATING,
    PROVENANCE_COLUMN,
    RATING_COLUMN,
    TITLE_COLUMN,
    UNKNOWN_GENRE,
    YEAR_COLUMN,
};
pub use validation::{validate_file, validate_table, ValidationReport};

//! Builds the recovery backlog.
//!
//! The backlog is every record of the clean dataset whose id is missing
//! from the curated "final" dataset. When no final dataset exists yet, one
//! is created by dropping the unrated records, which makes the backlog
//! exactly the records without a rating.

use crate::config::AuditConfig;
use anyhow::{Context, Result};
use data_loader::{
    parser, Dataset, Record, RecordId, Table, GENRES_COLUMN, ID_COLUMN, TITLE_COLUMN, YEAR_COLUMN,
};
use std::collections::HashSet;
use tracing::info;

/// Column carried into the audit file when the dataset has it
pub const LANGUAGE_COLUMN: &str = "original_language";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    pub backlog: usize,
    /// True when the final dataset had to be derived from the clean one
    pub created_final: bool,
    pub final_rows: usize,
}

/// The clean dataset minus every record without a rating.
pub fn drop_unrated(dataset: &Dataset) -> Dataset {
    dataset.filtered(|r| r.rating.is_some())
}

/// Records of `original` whose id is absent from `final_ids`, in file order.
pub fn find_backlog<'a>(original: &'a Dataset, final_ids: &HashSet<RecordId>) -> Vec<&'a Record> {
    original
        .records()
        .iter()
        .filter(|r| !final_ids.contains(&r.id))
        .collect()
}

/// Project backlog records onto the audit file columns.
pub fn audit_table(records: &[&Record], headers_of: &Dataset) -> Table {
    let mut headers: Vec<String> = [ID_COLUMN, TITLE_COLUMN, YEAR_COLUMN, GENRES_COLUMN]
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers_of.headers().iter().any(|h| h == LANGUAGE_COLUMN) {
        headers.push(LANGUAGE_COLUMN.to_string());
    }
    parser::project_records(records.iter().copied(), &headers)
}

/// Run the audit stage end to end.
pub fn run_audit(config: &AuditConfig) -> Result<AuditSummary> {
    config.check()?;
    let original = Dataset::load_from_file(&config.clean_path)
        .with_context(|| format!("Failed to load {}", config.clean_path.display()))?;

    let created_final = !config.final_path.exists();
    let final_ids: HashSet<RecordId> = if created_final {
        info!(
            "Creating {} by dropping rows with missing ratings",
            config.final_path.display()
        );
        let final_dataset = drop_unrated(&original);
        parser::write_dataset(&config.final_path, &final_dataset)
            .with_context(|| format!("Failed to write {}", config.final_path.display()))?;
        final_dataset.records().iter().map(|r| r.id).collect()
    } else {
        let table = parser::read_table(&config.final_path)?;
        parser::parse_id_set(&table, &config.final_path.display().to_string())?
    };

    let backlog = find_backlog(&original, &final_ids);
    parser::write_table(&config.audit_path, &audit_table(&backlog, &original))
        .with_context(|| format!("Failed to write {}", config.audit_path.display()))?;
    info!(
        "Audit file created at {} ({} movies in backlog)",
        config.audit_path.display(),
        backlog.len()
    );

    Ok(AuditSummary {
        backlog: backlog.len(),
        created_final,
        final_rows: final_ids.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CLEAN: &str = "tmdb_id,title,year,lb_rating,genres,original_language,budget\n\
                         1,Ran,1985,4.3,\"Drama, War\",ja,11000000\n\
                         2,Mother,2009,,Crime,ko,\n\
                         3,Yi Yi,2000,,Drama,zh,\n";

    fn config(dir: &std::path::Path) -> AuditConfig {
        AuditConfig {
            clean_path: dir.join("clean.csv"),
            final_path: dir.join("final.csv"),
            audit_path: dir.join("audit.csv"),
        }
    }

    #[test]
    fn test_creates_final_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        fs::write(&config.clean_path, CLEAN).unwrap();

        let summary = run_audit(&config).unwrap();
        assert!(summary.created_final);
        assert_eq!(summary.backlog, 2);
        assert_eq!(summary.final_rows, 1);

        let audit = fs::read_to_string(&config.audit_path).unwrap();
        assert_eq!(
            audit,
            "tmdb_id,title,year,genres,original_language\n\
             2,Mother,2009,Crime,ko\n\
             3,Yi Yi,2000,Drama,zh\n"
        );

        let entries = parser::load_audit_entries(&config.audit_path).unwrap();
        assert_eq!(entries[1].title, "Yi Yi");
    }

    #[test]
    fn test_uses_existing_final() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        fs::write(&config.clean_path, CLEAN).unwrap();
        // Curated by hand: Mother was kept even without a rating
        fs::write(&config.final_path, "tmdb_id,title\n1,Ran\n2,Mother\n").unwrap();

        let summary = run_audit(&config).unwrap();
        assert!(!summary.created_final);
        assert_eq!(summary.backlog, 1);

        let entries = parser::load_audit_entries(&config.audit_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 3);
    }

    #[test]
    fn test_audit_cannot_overwrite_clean() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        fs::write(&config.clean_path, CLEAN).unwrap();
        config.audit_path = config.clean_path.clone();

        assert!(run_audit(&config).is_err());
        assert_eq!(fs::read_to_string(&config.clean_path).unwrap(), CLEAN);
        assert!(!config.final_path.exists());
    }

    #[test]
    fn test_blank_year_row_is_audited() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        fs::write(
            &config.clean_path,
            "tmdb_id,title,year,lb_rating\n1,Ran,1985,4.3\n4,Untitled,,\n",
        )
        .unwrap();

        let summary = run_audit(&config).unwrap();
        assert_eq!(summary.backlog, 1);
        assert_eq!(
            fs::read_to_string(&config.audit_path).unwrap(),
            "tmdb_id,title,year,genres\n4,Untitled,,\n"
        );
    }

    #[test]
    fn test_missing_clean_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_audit(&config(dir.path())).is_err());
    }
}

//! Explicit configuration for each batch stage.
//!
//! Defaults reproduce the fixed `data/` layout of the project, so every
//! stage can run with no arguments.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_AUDIT_PATH: &str = "data/missing_ratings_audit.csv";
pub const DEFAULT_CLEAN_PATH: &str = "data/asian_cinema_stats_CLEAN.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/asian_cinema_RECOVERED.csv";
pub const DEFAULT_FINAL_PATH: &str = "data/asian_cinema_FINAL.csv";
pub const DEFAULT_RAW_PATH: &str = "data/asian_cinema_stats_ja_ko_zh_th.csv";

/// Courtesy pause between consecutive external lookups
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Settings for the rating-recovery run.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub audit_path: PathBuf,
    pub clean_path: PathBuf,
    pub output_path: PathBuf,
    pub request_delay: Duration,
    /// Write the `lb_rating_source` column alongside the ratings
    pub keep_provenance: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            audit_path: PathBuf::from(DEFAULT_AUDIT_PATH),
            clean_path: PathBuf::from(DEFAULT_CLEAN_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            request_delay: DEFAULT_REQUEST_DELAY,
            keep_provenance: true,
        }
    }
}

impl RecoveryConfig {
    /// Reject configurations that would overwrite an input.
    pub fn check(&self) -> Result<()> {
        for input in [&self.clean_path, &self.audit_path] {
            if same_file(input, &self.output_path) {
                bail!(
                    "Output path {} must differ from input {}",
                    self.output_path.display(),
                    input.display()
                );
            }
        }
        Ok(())
    }
}

/// Settings for the audit stage.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub clean_path: PathBuf,
    pub final_path: PathBuf,
    pub audit_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            clean_path: PathBuf::from(DEFAULT_CLEAN_PATH),
            final_path: PathBuf::from(DEFAULT_FINAL_PATH),
            audit_path: PathBuf::from(DEFAULT_AUDIT_PATH),
        }
    }
}

impl AuditConfig {
    /// Reject configurations where one file would overwrite another.
    pub fn check(&self) -> Result<()> {
        for (output, input) in [
            (&self.audit_path, &self.clean_path),
            (&self.audit_path, &self.final_path),
            (&self.final_path, &self.clean_path),
        ] {
            if same_file(input, output) {
                bail!(
                    "Output path {} must differ from input {}",
                    output.display(),
                    input.display()
                );
            }
        }
        Ok(())
    }
}

/// Settings for the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub raw_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from(DEFAULT_RAW_PATH),
            output_path: PathBuf::from(DEFAULT_CLEAN_PATH),
        }
    }
}

impl CleanConfig {
    pub fn check(&self) -> Result<()> {
        if same_file(&self.raw_path, &self.output_path) {
            bail!(
                "Output path {} must differ from input {}",
                self.output_path.display(),
                self.raw_path.display()
            );
        }
        Ok(())
    }
}

/// True when both paths name the same file, resolving links when they exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

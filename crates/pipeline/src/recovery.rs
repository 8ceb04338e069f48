//! # Rating Recovery
//!
//! Coordinates the whole recovery batch:
//! 1. Check configuration and that both inputs exist
//! 2. Load the audit list and the clean dataset
//! 3. Build the median tables from rated records
//! 4. Resolve every audit entry (sequential, rate limited)
//! 5. Merge resolutions into a copy of the dataset
//! 6. Write the merged dataset once, atomically, to the output path

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use data_loader::{parser, DataLoadError, Dataset};
use sources::RatingSource;

use crate::config::RecoveryConfig;
use crate::median::MedianEstimator;
use crate::merger::{merge, MergeSummary};
use crate::resolver::{Provenance, Resolver};

#[derive(Debug, Clone)]
pub struct RecoverySummary {
    pub audited: usize,
    pub fetched: usize,
    pub median: usize,
    pub merge: MergeSummary,
    pub output_path: PathBuf,
}

/// Run the recovery batch against `source`.
pub async fn run_recovery(
    config: &RecoveryConfig,
    source: Arc<dyn RatingSource>,
) -> Result<RecoverySummary> {
    let start = Instant::now();
    config.check()?;
    for input in [&config.audit_path, &config.clean_path] {
        if !input.exists() {
            return Err(DataLoadError::FileNotFound {
                path: input.display().to_string(),
            })
            .context("Required files missing");
        }
    }

    let entries = parser::load_audit_entries(&config.audit_path)
        .with_context(|| format!("Failed to load {}", config.audit_path.display()))?;
    let dataset = Dataset::load_from_file(&config.clean_path)
        .with_context(|| format!("Failed to load {}", config.clean_path.display()))?;
    info!("{} audit entries to resolve", entries.len());

    info!("Calculating genre medians...");
    let estimator = Arc::new(
        MedianEstimator::from_records(dataset.rated_records())
            .context("Failed to build median fallback")?,
    );

    let resolver = Resolver::new(source, estimator, config.request_delay);
    let resolutions = resolver.resolve_all(&entries).await;
    let fetched = resolutions
        .iter()
        .filter(|r| r.provenance == Provenance::Fetched)
        .count();

    let (merged, merge_summary) = merge(&dataset, &resolutions, config.keep_provenance);
    parser::write_dataset(&config.output_path, &merged)
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;

    info!(
        "Recovery complete in {:?}: {} filled, saved to {}",
        start.elapsed(),
        merge_summary.filled(),
        config.output_path.display()
    );

    Ok(RecoverySummary {
        audited: entries.len(),
        fetched,
        median: resolutions.len() - fetched,
        merge: merge_summary,
        output_path: config.output_path.clone(),
    })
}

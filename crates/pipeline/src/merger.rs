//! Writes resolved ratings back into the dataset by id.
//!
//! Known ratings are never overwritten. Records that were neither rated nor
//! audited stay null. The input dataset is left untouched; the merge
//! produces a new one.

use crate::resolver::{Provenance, Resolution};
use data_loader::{Dataset, RecordId, PROVENANCE_COLUMN, RATING_COLUMN};
use std::collections::HashMap;
use tracing::warn;

/// Provenance value for ratings present before recovery
pub const ORIGINAL_TAG: &str = "original";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub kept_original: usize,
    pub filled_fetched: usize,
    pub filled_median: usize,
    /// Null ratings with no resolution (never audited)
    pub still_missing: usize,
    /// Resolutions whose id is not in the dataset
    pub unknown_ids: usize,
    /// Resolutions ignored because an earlier one had the same id
    pub duplicate_ids: usize,
    /// Resolutions ignored because the record already had a rating
    pub already_rated: usize,
}

impl MergeSummary {
    pub fn filled(&self) -> usize {
        self.filled_fetched + self.filled_median
    }
}

/// Merge resolutions into a copy of `dataset`.
///
/// The first resolution for an id wins. When `keep_provenance` is set an
/// `lb_rating_source` column is added after `lb_rating`; rated records that
/// already carry a tag keep it.
pub fn merge(
    dataset: &Dataset,
    resolutions: &[Resolution],
    keep_provenance: bool,
) -> (Dataset, MergeSummary) {
    let mut summary = MergeSummary::default();

    let mut by_id: HashMap<RecordId, &Resolution> = HashMap::with_capacity(resolutions.len());
    for resolution in resolutions {
        if by_id.contains_key(&resolution.id) {
            warn!("Duplicate resolution for id {}; keeping the first", resolution.id);
            summary.duplicate_ids += 1;
            continue;
        }
        if !dataset.contains(resolution.id) {
            warn!("Audited id {} is not in the dataset; ignored", resolution.id);
            summary.unknown_ids += 1;
            continue;
        }
        by_id.insert(resolution.id, resolution);
    }

    let mut merged = dataset.clone();
    if keep_provenance {
        merged.add_column(PROVENANCE_COLUMN, RATING_COLUMN);
    }

    for record in dataset.records() {
        let tag = match (record.rating, by_id.get(&record.id)) {
            (Some(_), resolution) => {
                if resolution.is_some() {
                    summary.already_rated += 1;
                }
                summary.kept_original += 1;
                // a rerun over recovered output keeps the earlier tag
                record
                    .extra
                    .get(PROVENANCE_COLUMN)
                    .map(String::as_str)
                    .filter(|tag| !tag.is_empty())
                    .unwrap_or(ORIGINAL_TAG)
            }
            (None, Some(resolution)) => {
                merged.set_rating(record.id, Some(resolution.rating));
                match resolution.provenance {
                    Provenance::Fetched => summary.filled_fetched += 1,
                    Provenance::Median(_) => summary.filled_median += 1,
                }
                resolution.provenance.tag()
            }
            (None, None) => {
                summary.still_missing += 1;
                ""
            }
        };
        if keep_provenance {
            merged.set_extra(record.id, PROVENANCE_COLUMN, tag);
        }
    }

    (merged, summary)
}

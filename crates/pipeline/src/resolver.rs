//! Resolves a rating for every audited record.
//!
//! Each entry is looked up on the external source first. The lookup
//! produces an explicit [`LookupOutcome`]; anything other than `Found`
//! falls back to the [`MedianEstimator`]. Entries are processed one at a
//! time with a courtesy pause between lookups.

use crate::median::{MedianEstimator, MedianTier};
use data_loader::{AuditEntry, RecordId, MAX_RATING, MIN_RATING};
use sources::{LookupOutcome, RatingSource};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a resolved rating came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provenance {
    Fetched,
    Median(MedianTier),
}

impl Provenance {
    /// Tag written to the output file
    pub fn tag(&self) -> &'static str {
        match self {
            Provenance::Fetched => "fetched",
            Provenance::Median(_) => "median",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Fetched => f.write_str("fetched"),
            Provenance::Median(tier) => write!(f, "median ({})", tier),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub id: RecordId,
    pub rating: f64,
    pub provenance: Provenance,
}

pub struct Resolver {
    source: Arc<dyn RatingSource>,
    estimator: Arc<MedianEstimator>,
    request_delay: Duration,
}

impl Resolver {
    pub fn new(
        source: Arc<dyn RatingSource>,
        estimator: Arc<MedianEstimator>,
        request_delay: Duration,
    ) -> Self {
        Self {
            source,
            estimator,
            request_delay,
        }
    }

    /// Look the entry up on the external source.
    ///
    /// ## Algorithm
    /// 1. Search by title
    /// 2. Keep the first candidate whose release year equals the entry's year
    /// 3. Fetch that film's rating
    ///
    /// Source errors and out-of-range ratings become `Failed`; no year
    /// match or an unrated film becomes `NoMatch`.
    pub async fn lookup(&self, entry: &AuditEntry) -> LookupOutcome {
        let candidates = match self.source.search(&entry.title).await {
            Ok(candidates) => candidates,
            Err(e) => {
                return LookupOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(candidate) = candidates
            .into_iter()
            .find(|c| c.release_year() == Some(entry.year))
        else {
            return LookupOutcome::NoMatch;
        };
        debug!(
            "Matched '{}' ({}) to {} on {}",
            entry.title,
            entry.year,
            candidate.film,
            self.source.name()
        );

        match self.source.fetch_rating(&candidate.film).await {
            Ok(Some(rating)) if (MIN_RATING..=MAX_RATING).contains(&rating) => {
                LookupOutcome::Found {
                    film: candidate.film,
                    rating,
                }
            }
            Ok(Some(rating)) => LookupOutcome::Failed {
                reason: format!("rating {} for {} is out of range", rating, candidate.film),
            },
            Ok(None) => LookupOutcome::NoMatch,
            Err(e) => LookupOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Resolve one entry: fetched rating if available, else a median.
    pub async fn resolve(&self, entry: &AuditEntry) -> Resolution {
        match self.lookup(entry).await {
            LookupOutcome::Found { rating, .. } => {
                info!("  Found rating: {}", rating);
                return Resolution {
                    id: entry.id,
                    rating,
                    provenance: Provenance::Fetched,
                };
            }
            LookupOutcome::NoMatch => {
                info!("  No matching film found on {}", self.source.name());
            }
            LookupOutcome::Failed { reason } => {
                warn!("  Lookup failed for '{}': {}", entry.title, reason);
            }
        }

        let estimate = self
            .estimator
            .estimate(entry.genres.as_deref(), entry.year);
        info!("  Fallback to {} median: {:.2}", estimate.tier, estimate.value);
        Resolution {
            id: entry.id,
            rating: estimate.value,
            provenance: Provenance::Median(estimate.tier),
        }
    }

    /// Resolve every entry sequentially, pausing between lookups.
    pub async fn resolve_all(&self, entries: &[AuditEntry]) -> Vec<Resolution> {
        let total = entries.len();
        let mut resolutions = Vec::with_capacity(total);
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            info!("[{}/{}] Processing: {} ({})", i + 1, total, entry.title, entry.year);
            resolutions.push(self.resolve(entry).await);
        }
        resolutions
    }
}

//! Tiered median estimator used when a rating cannot be fetched.
//!
//! Statistics are precomputed once from the records that already have a
//! rating:
//! 1. median per (primary genre, decade bucket)
//! 2. median per primary genre
//! 3. global median
//!
//! [`MedianEstimator::estimate`] answers from the most specific tier that
//! has data.

use data_loader::{Record, UNKNOWN_GENRE};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;
use tracing::{debug, warn};

/// Years outside this range are not bucketed into decades
pub const MIN_BUCKET_YEAR: i32 = 1870;
pub const MAX_BUCKET_YEAR: i32 = 2100;

#[derive(Error, Debug, PartialEq)]
pub enum EstimatorError {
    #[error("Cannot estimate ratings: the dataset has no rated records")]
    EmptyDataset,
}

/// Which tier produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MedianTier {
    GenreDecade,
    Genre,
    Global,
}

impl fmt::Display for MedianTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MedianTier::GenreDecade => "genre/decade",
            MedianTier::Genre => "genre",
            MedianTier::Global => "global",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub tier: MedianTier,
}

/// Year rounded down to its decade, or `None` for implausible years.
///
/// Example: 1997 -> Some(1990), 2000 -> Some(2000), 12 -> None
pub fn decade_bucket(year: i32) -> Option<i32> {
    (MIN_BUCKET_YEAR..=MAX_BUCKET_YEAR)
        .contains(&year)
        .then(|| year - year.rem_euclid(10))
}

/// Median of a slice; the mean of the middle pair for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Collapse grouped samples into per-group medians.
fn group_medians<K>(groups: HashMap<K, Vec<f64>>) -> HashMap<K, f64>
where
    K: Eq + Hash + Send,
{
    groups
        .into_par_iter()
        .filter_map(|(key, mut values)| median(&mut values).map(|m| (key, m)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct MedianEstimator {
    by_genre_decade: HashMap<(String, i32), f64>,
    by_genre: HashMap<String, f64>,
    global: f64,
}

impl MedianEstimator {
    /// Build the median tables from rated records.
    ///
    /// Records without a rating are ignored. Records without a genre only
    /// contribute to the global median; records with a missing or
    /// implausible year skip the decade tier.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Result<Self, EstimatorError> {
        let mut by_genre_decade: HashMap<(String, i32), Vec<f64>> = HashMap::new();
        let mut by_genre: HashMap<String, Vec<f64>> = HashMap::new();
        let mut all = Vec::new();

        for record in records {
            let Some(rating) = record.rating else {
                continue;
            };
            all.push(rating);

            let Some(genre) = record.primary_genre() else {
                continue;
            };
            by_genre.entry(genre.to_string()).or_default().push(rating);

            let Some(year) = record.year else {
                debug!("Record {} has no year; skipped for decade medians", record.id);
                continue;
            };
            match decade_bucket(year) {
                Some(decade) => by_genre_decade
                    .entry((genre.to_string(), decade))
                    .or_default()
                    .push(rating),
                None => warn!(
                    "Record {} has out-of-range year {}; skipped for decade medians",
                    record.id, year
                ),
            }
        }

        let global = median(&mut all).ok_or(EstimatorError::EmptyDataset)?;
        let estimator = Self {
            by_genre_decade: group_medians(by_genre_decade),
            by_genre: group_medians(by_genre),
            global,
        };
        debug!(
            "Median tables: {} genre/decade groups, {} genres, global {:.2}",
            estimator.by_genre_decade.len(),
            estimator.by_genre.len(),
            estimator.global
        );
        Ok(estimator)
    }

    /// Estimate a rating for a film of the given genre list and year.
    ///
    /// An absent or blank genre is looked up as "Unknown".
    pub fn estimate(&self, genres: Option<&str>, year: i32) -> Estimate {
        let genre = data_loader::primary_genre(genres).unwrap_or(UNKNOWN_GENRE);

        if let Some(&value) = decade_bucket(year)
            .and_then(|decade| self.by_genre_decade.get(&(genre.to_string(), decade)))
        {
            return Estimate {
                value,
                tier: MedianTier::GenreDecade,
            };
        }
        if let Some(&value) = self.by_genre.get(genre) {
            return Estimate {
                value,
                tier: MedianTier::Genre,
            };
        }
        Estimate {
            value: self.global,
            tier: MedianTier::Global,
        }
    }

    pub fn global_median(&self) -> f64 {
        self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::RecordId;

    fn rated(id: RecordId, genres: Option<&str>, year: i32, rating: Option<f64>) -> Record {
        Record {
            id,
            title: format!("Film {}", id),
            year: Some(year),
            genres: genres.map(str::to_string),
            rating,
            extra: HashMap::new(),
        }
    }

    fn estimator() -> MedianEstimator {
        let records = vec![
            rated(1, Some("Drama, Romance"), 1991, Some(4.0)),
            rated(2, Some("Drama"), 1998, Some(3.0)),
            rated(3, Some("Drama"), 2005, Some(2.0)),
            rated(4, Some("Horror"), 2012, Some(3.2)),
            rated(5, None, 1980, Some(1.0)),
            rated(6, Some("Drama"), 1995, None),
        ];
        MedianEstimator::from_records(&records).unwrap()
    }

    #[test]
    fn test_decade_bucket() {
        assert_eq!(decade_bucket(1997), Some(1990));
        assert_eq!(decade_bucket(2000), Some(2000));
        assert_eq!(decade_bucket(1870), Some(1870));
        assert_eq!(decade_bucket(12), None);
        assert_eq!(decade_bucket(3021), None);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_genre_decade_tier() {
        let estimate = estimator().estimate(Some("Drama, Crime"), 1993);
        assert_eq!(estimate.tier, MedianTier::GenreDecade);
        assert_eq!(estimate.value, 3.5);
    }

    #[test]
    fn test_genre_tier_when_decade_empty() {
        // Drama has no 1960s ratings, but has ratings elsewhere
        let estimate = estimator().estimate(Some("Drama"), 1964);
        assert_eq!(estimate.tier, MedianTier::Genre);
        assert_eq!(estimate.value, 3.0);
    }

    #[test]
    fn test_global_tier_for_unseen_genre() {
        let estimator = estimator();
        let estimate = estimator.estimate(Some("Western"), 1993);
        assert_eq!(estimate.tier, MedianTier::Global);
        // 1.0, 2.0, 3.0, 3.2, 4.0
        assert_eq!(estimate.value, 3.0);
        assert_eq!(estimator.global_median(), 3.0);
    }

    #[test]
    fn test_missing_genre_is_unknown() {
        let estimate = estimator().estimate(None, 1980);
        assert_eq!(estimate.tier, MedianTier::Global);
    }

    #[test]
    fn test_out_of_range_year_skips_decade_tier() {
        let estimate = estimator().estimate(Some("Drama"), 199);
        assert_eq!(estimate.tier, MedianTier::Genre);
    }

    #[test]
    fn test_missing_year_counts_for_genre_and_global() {
        let mut undated = rated(7, Some("Horror"), 0, Some(1.0));
        undated.year = None;
        let records = vec![undated, rated(8, Some("Horror"), 2012, Some(3.0))];
        let estimator = MedianEstimator::from_records(&records).unwrap();

        // Only the dated record forms the 2010s group
        let estimate = estimator.estimate(Some("Horror"), 2015);
        assert_eq!(estimate.tier, MedianTier::GenreDecade);
        assert_eq!(estimate.value, 3.0);

        let estimate = estimator.estimate(Some("Horror"), 1975);
        assert_eq!(estimate.tier, MedianTier::Genre);
        assert_eq!(estimate.value, 2.0);
        assert_eq!(estimator.global_median(), 2.0);
    }

    #[test]
    fn test_empty_dataset() {
        let records = vec![rated(1, Some("Drama"), 1990, None)];
        assert_eq!(
            MedianEstimator::from_records(&records).unwrap_err(),
            EstimatorError::EmptyDataset
        );
    }
}

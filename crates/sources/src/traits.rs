//! The seam between the resolver and whatever answers rating lookups.

use crate::error::Result;
use crate::types::{FilmCandidate, FilmRef};
use async_trait::async_trait;

/// An external source of authoritative ratings.
///
/// `Send + Sync` so a source can be shared behind an `Arc` by the resolver.
#[async_trait]
pub trait RatingSource: Send + Sync {
    /// Returns the name of this source (for logging)
    fn name(&self) -> &str;

    /// Search films by title. Candidates keep the source's own ordering.
    async fn search(&self, title: &str) -> Result<Vec<FilmCandidate>>;

    /// Fetch the rating of one film; `Ok(None)` when the film is unrated.
    async fn fetch_rating(&self, film: &FilmRef) -> Result<Option<f64>>;
}

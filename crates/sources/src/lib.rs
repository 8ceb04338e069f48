//! # Sources Crate
//!
//! External rating sources consulted when a record is missing its rating.
//!
//! ## Components
//!
//! ### RatingSource
//! The trait the resolver talks to: title search returning candidate films,
//! and a per-film rating fetch. Both calls are fallible; the resolver turns
//! every failure into a median fallback.
//!
//! ### LetterboxdSource
//! HTTP implementation against the Letterboxd website (search page plus
//! film page metadata).
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{LetterboxdConfig, LetterboxdSource, RatingSource};
//!
//! let source = LetterboxdSource::new(LetterboxdConfig::default())?;
//! let candidates = source.search("Tokyo Story").await?;
//! if let Some(first) = candidates.iter().find(|c| c.release_year() == Some(1953)) {
//!     let rating = source.fetch_rating(&first.film).await?;
//! }
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod traits;
pub mod letterboxd;

// Re-export commonly used types
pub use error::SourceError;
pub use letterboxd::{LetterboxdConfig, LetterboxdSource};
pub use traits::RatingSource;
pub use types::{FilmCandidate, FilmRef, LookupOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(year: Option<&str>) -> FilmCandidate {
        FilmCandidate::new("Ugetsu", year, FilmRef::new("ugetsu"))
    }

    #[test]
    fn test_release_year_coercion() {
        assert_eq!(candidate(Some("1953")).release_year(), Some(1953));
        assert_eq!(candidate(Some(" 1953 ")).release_year(), Some(1953));
        assert_eq!(candidate(Some("1953.0")).release_year(), Some(1953));
        assert_eq!(candidate(Some("1953.5")).release_year(), None);
        assert_eq!(candidate(Some("TBA")).release_year(), None);
        assert_eq!(candidate(None).release_year(), None);
    }

    #[test]
    fn test_film_ref_display() {
        assert_eq!(FilmRef::new("in-the-mood-for-love").to_string(), "in-the-mood-for-love");
    }
}

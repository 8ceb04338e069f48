//! Types exchanged with external rating sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a film on the external source (a Letterboxd slug).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmRef(pub String);

impl FilmRef {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilmRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One search hit, in the order the source returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmCandidate {
    pub title: String,
    /// Release year as the source printed it; may be missing or malformed
    pub year: Option<String>,
    pub film: FilmRef,
}

impl FilmCandidate {
    pub fn new(title: impl Into<String>, year: Option<&str>, film: FilmRef) -> Self {
        Self {
            title: title.into(),
            year: year.map(str::to_string),
            film,
        }
    }

    /// Release year coerced to an integer.
    ///
    /// Accepts surrounding whitespace and integral floats ("1995.0").
    /// Missing or non-numeric years yield `None`.
    pub fn release_year(&self) -> Option<i32> {
        let raw = self.year.as_deref()?.trim();
        if let Ok(year) = raw.parse::<i32>() {
            return Some(year);
        }
        let value = raw.parse::<f64>().ok()?;
        (value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64)
            .then_some(value as i32)
    }
}

/// Result of looking up one title on an external source.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// A year-matching film was found and it has a rating
    Found { film: FilmRef, rating: f64 },
    /// No candidate matched, or the matching film has no rating
    NoMatch,
    /// The source errored or returned something unusable
    Failed { reason: String },
}

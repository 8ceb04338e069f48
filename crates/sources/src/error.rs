//! Errors raised by external rating sources.

use thiserror::Error;

/// Failures while talking to, or making sense of, an external source.
///
/// The resolver never propagates these; they become
/// [`LookupOutcome::Failed`](crate::LookupOutcome::Failed) and the entry
/// falls back to a median estimate.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

//! Batch stages for the cinema ratings dataset.
//!
//! This crate provides:
//! - MedianEstimator: tiered (genre/decade, genre, global) rating fallback
//! - Resolver: external lookup with median fallback, one entry at a time
//! - merge: backfill resolved ratings into a copy of the dataset
//! - run_recovery: the whole recovery batch
//! - run_audit / run_clean: the stages that prepare its inputs
//!
//! ## Architecture
//! The recovery batch processes records in stages:
//! 1. Loader reads the audit list and the clean dataset
//! 2. MedianEstimator is built once from rated records
//! 3. Resolver handles each audit entry sequentially
//! 4. Merger writes the results to a new file
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{run_recovery, RecoveryConfig};
//! use sources::{LetterboxdConfig, LetterboxdSource};
//! use std::sync::Arc;
//!
//! let source = Arc::new(LetterboxdSource::new(LetterboxdConfig::default())?);
//! let summary = run_recovery(&RecoveryConfig::default(), source).await?;
//! println!("{} ratings fetched", summary.fetched);
//! ```

pub mod config;
pub mod median;
pub mod resolver;
pub mod merger;
pub mod audit;
pub mod cleaning;
pub mod recovery;

// Re-export main types
pub use config::{AuditConfig, CleanConfig, RecoveryConfig};
pub use median::{Estimate, EstimatorError, MedianEstimator, MedianTier};
pub use resolver::{Provenance, Resolution, Resolver};
pub use merger::{merge, MergeSummary};
pub use audit::{run_audit, AuditSummary};
pub use cleaning::{run_clean, CleanSummary};
pub use recovery::{run_recovery, RecoverySummary};

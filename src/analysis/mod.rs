//! Result aggregation
//!
//! Folds the per-stage feature results into the practice score and the
//! output records.

pub mod metadata;
pub mod result;
pub mod scoring;

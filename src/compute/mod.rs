//! Compute module - Scoring and statistics for the novelty archive.

mod distance;
mod weighting;

pub mod novelty;
pub mod stats;

pub use distance::*;
pub use weighting::*;

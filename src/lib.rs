//! Novelty Archive - Behavior archive for novelty search.
//!
//! This crate scores behavior descriptors by their distance to an archive of
//! previously seen novel behaviors, admits sufficiently novel ones, and adapts
//! the admission threshold to keep the archive growing at a steady pace.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Archive configuration and novelty items
//! - `compute`: Dispersion statistics, dimension weighting, distances and the
//!   archive itself
//!
//! # Example
//!
//! ```rust,no_run
//! use novelty_archive::{
//!     ArchiveConfig, NoveltyArchive, NoveltyItem,
//!     compute::weighted_euclidean,
//! };
//!
//! let config = ArchiveConfig::default();
//! let mut archive: NoveltyArchive = NoveltyArchive::with_distance(config, weighted_euclidean)?;
//!
//! // Generational use: queue candidates, then close the generation
//! for i in 0..20 {
//!     let x = i as f32 * 0.5;
//!     archive.add_to_generation(NoveltyItem::from_descriptor(vec![x, -x, x, -x]));
//! }
//! archive.end_of_generation()?;
//!
//! println!("Archived {} items, threshold {:.3}", archive.len(), archive.threshold());
//! # Ok::<(), novelty_archive::ArchiveError>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::novelty::{ArchiveError, EvaluationMode, FittestList, NoveltyArchive};
pub use schema::{ArchiveConfig, DispersionMethod, Genotype, NoveltyItem};

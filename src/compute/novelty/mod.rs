//! Novelty search archive.
//!
//! Scores behavior descriptors by how far they sit from previously archived
//! behaviors and keeps the ones that are novel enough.
//!
//! # Overview
//!
//! - **Archive** (`archive`): k-NN novelty and density scoring, admission,
//!   adaptive threshold control, generational and steady-state bookkeeping
//! - **Fittest list** (`fittest`): Bounded list of the fittest items seen
//! - **Records** (`record`): Text format for archived items and detail files
//!
//! # Example
//!
//! ```rust,no_run
//! use novelty_archive::compute::novelty::{EvaluationMode, NoveltyArchive};
//! use novelty_archive::compute::weighted_euclidean;
//! use novelty_archive::schema::{ArchiveConfig, NoveltyItem};
//!
//! let mut archive: NoveltyArchive =
//!     NoveltyArchive::with_distance(ArchiveConfig::default(), weighted_euclidean)?;
//!
//! let mut population: Vec<NoveltyItem> = (0..10)
//!     .map(|i| NoveltyItem::from_descriptor(vec![i as f32, 0.0, i as f32, 0.0]))
//!     .collect();
//!
//! archive.evaluate_population(&mut population, EvaluationMode::Admission);
//! archive.end_of_generation_steady()?;
//!
//! println!("Archive size: {}, threshold: {:.3}", archive.len(), archive.threshold());
//! # Ok::<(), novelty_archive::compute::novelty::ArchiveError>(())
//! ```
//!
//! # Threshold control
//!
//! - A cycle with no admissions counts as starved (with hall of fame, a cycle
//!   with only the forced admission)
//! - Ten starved cycles in a row multiply the threshold by 0.95, never below
//!   the configured floor
//! - More than four admissions in a cycle multiply it by 1.2

mod archive;
mod fittest;
mod record;

pub use archive::{
    ARCHIVE_SEED_AMOUNT, ArchiveError, EvaluationMode, MIN_ACCEPTABLE_NOVELTY, NoveltyArchive,
    RANDOM_ADMISSION_RATE, STARVATION_LIMIT, SURPLUS_LIMIT, THRESHOLD_DECAY, THRESHOLD_GROWTH,
};
pub use fittest::{FITTEST_CAPACITY, FittestList};
pub use record::{
    NoveltyPoint, RecordError, parse_novelty_point, parse_novelty_points, save_items,
    save_points, write_item, write_novelty_point,
};

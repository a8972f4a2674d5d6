//! Configuration types for the novelty archive.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Statistic used to measure how much a behavior dimension varies across the
/// archive. Drives the per-dimension distance weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DispersionMethod {
    /// Shannon entropy of exact values.
    #[default]
    Entropy,
    /// Population standard deviation.
    StandardDeviation,
    /// Mean absolute deviation from the mean.
    MeanAbsoluteDeviation,
    /// Inner quartile range (half-split convention).
    InnerQuartileRange,
    /// Max minus min.
    Range,
    /// Population variance.
    Variance,
}

impl DispersionMethod {
    /// All methods, in selector-code order.
    pub const ALL: [DispersionMethod; 6] = [
        DispersionMethod::Entropy,
        DispersionMethod::StandardDeviation,
        DispersionMethod::MeanAbsoluteDeviation,
        DispersionMethod::InnerQuartileRange,
        DispersionMethod::Range,
        DispersionMethod::Variance,
    ];

    /// Numeric selector code (1-based).
    pub fn code(self) -> u8 {
        match self {
            DispersionMethod::Entropy => 1,
            DispersionMethod::StandardDeviation => 2,
            DispersionMethod::MeanAbsoluteDeviation => 3,
            DispersionMethod::InnerQuartileRange => 4,
            DispersionMethod::Range => 5,
            DispersionMethod::Variance => 6,
        }
    }
}

impl TryFrom<u8> for DispersionMethod {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|method| method.code() == code)
            .ok_or(ConfigError::UnknownDispersionMethod(code))
    }
}

/// Top-level novelty archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Starting admission threshold. Must not be below `threshold_floor`.
    #[serde(default = "default_initial_threshold")]
    pub initial_threshold: f32,
    /// Lowest value the adaptive threshold may reach.
    #[serde(default = "default_threshold_floor")]
    pub threshold_floor: f32,
    /// Nearest neighbors used for the fitness-proxy (density) score.
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
    /// Dispersion statistic used for dimension weighting.
    #[serde(default)]
    pub dispersion: DispersionMethod,
    /// Number of descriptor components that receive a weight.
    #[serde(default = "default_weight_dimensions")]
    pub weight_dimensions: usize,
    /// Capacity of the fittest-so-far list.
    #[serde(default = "default_fittest_capacity")]
    pub fittest_capacity: usize,
    /// Force one admission per generation (the most novel candidate).
    #[serde(default)]
    pub hall_of_fame: bool,
    /// Admit generation candidates whose novelty exceeds the threshold.
    #[serde(default = "default_threshold_add")]
    pub threshold_add: bool,
    /// Run log receiving `<threshold> <admitted>` once per adaptation cycle.
    #[serde(default)]
    pub run_log: Option<PathBuf>,
    /// Directory for per-generation candidate records (`out<generation>.dat`).
    #[serde(default)]
    pub detail_dir: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            initial_threshold: default_initial_threshold(),
            threshold_floor: default_threshold_floor(),
            neighbors: default_neighbors(),
            dispersion: DispersionMethod::default(),
            weight_dimensions: default_weight_dimensions(),
            fittest_capacity: default_fittest_capacity(),
            hall_of_fame: false,
            threshold_add: default_threshold_add(),
            run_log: None,
            detail_dir: None,
        }
    }
}

fn default_initial_threshold() -> f32 {
    1.0
}
fn default_threshold_floor() -> f32 {
    0.25
}
fn default_neighbors() -> usize {
    15
}
fn default_weight_dimensions() -> usize {
    4
}
fn default_fittest_capacity() -> usize {
    5
}
fn default_threshold_add() -> bool {
    true
}

impl ArchiveConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold_floor.is_finite() || self.threshold_floor < 0.0 {
            return Err(ConfigError::InvalidFloor(self.threshold_floor));
        }
        if !self.initial_threshold.is_finite() || self.initial_threshold < self.threshold_floor {
            return Err(ConfigError::ThresholdBelowFloor {
                threshold: self.initial_threshold,
                floor: self.threshold_floor,
            });
        }
        if self.neighbors == 0 {
            return Err(ConfigError::InvalidNeighbors);
        }
        if self.weight_dimensions == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fittest_capacity == 0 {
            return Err(ConfigError::InvalidFittestCapacity);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Threshold floor must be finite and non-negative, got {0}")]
    InvalidFloor(f32),
    #[error("Initial threshold {threshold} is below the floor {floor}")]
    ThresholdBelowFloor { threshold: f32, floor: f32 },
    #[error("Neighbor count must be non-zero")]
    InvalidNeighbors,
    #[error("Weight dimensions must be non-zero")]
    InvalidDimensions,
    #[error("Fittest list capacity must be non-zero")]
    InvalidFittestCapacity,
    #[error("Unknown dispersion method code {0} (expected 1-6)")]
    UnknownDispersionMethod(u8),
}

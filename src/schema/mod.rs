//! Schema module - Configuration and item types for the novelty archive.

mod config;
mod item;

pub use config::*;
pub use item::*;

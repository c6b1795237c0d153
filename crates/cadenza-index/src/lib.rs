//! Feature index for cadenza.
//!
//! Converts a finalized `TrackTable` into a per-column standardized
//! feature matrix with id ↔ row lookups, and persists that state as
//! three co-located artifacts that are validated against each other on
//! load.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod builder;
pub mod index;
pub mod persist;

pub use index::{FeatureIndex, ScalerStats, TrackIndex};

//! Core domain model for cadenza.
//!
//! This crate defines the `Track` record, the in-memory `TrackTable`
//! that the feature-engineering pipeline produces and the index builder
//! consumes, the canonical feature schema with its similarity weights,
//! and the shared error taxonomy.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod features;
pub mod table;
pub mod track;

pub use error::{Error, Result};
pub use features::FeatureWeights;
pub use table::TrackTable;
pub use track::Track;

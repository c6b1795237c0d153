//! Catalog ingestion and feature derivation for cadenza.
//!
//! Turns a raw catalog CSV into the finalized `TrackTable` the index
//! builder consumes: load, clean (drop broken rows, de-duplicate),
//! derive (range-normalized, combined, and temporal features). Every
//! step is a pure transform taking a table and returning a new one.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod clean;
pub mod config;
pub mod derive;
pub mod error;
pub mod load;
pub mod pipeline;

pub use clean::CleanReport;
pub use config::Config;
pub use error::{IngestError, IngestResult};
pub use load::{load_table, write_table};
pub use pipeline::{Pipeline, PipelineReport};

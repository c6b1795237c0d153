//! Similarity engine and recommendation orchestrator for cadenza.
//!
//! `similarity` scores catalog rows against a query vector under the
//! configured feature weights; `recommender` resolves user-level
//! requests (a seed track or desired feature values) into query
//! vectors and applies business-level filtering to the ranked
//! candidates.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod recommender;
pub mod similarity;

pub use recommender::{FeatureTarget, Recommendation, Recommender, SeedOptions};
pub use similarity::{apply_weights, apply_weights_vec, top_k};

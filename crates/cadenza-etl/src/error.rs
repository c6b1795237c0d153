//! Ingestion error types for the preprocessing pipeline.

use thiserror::Error;

/// Errors that can occur while loading or writing catalog tables.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The CSV reader or writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the input file.
    #[error("input file has no '{column}' column")]
    MissingColumn { column: String },

    /// An I/O failure outside the CSV layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A report could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error propagated from the core domain layer.
    #[error(transparent)]
    Core(#[from] cadenza_core::Error),
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

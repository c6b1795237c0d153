use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("schema error: feature column '{column}' missing from input table")]
    MissingFeatureColumn { column: String },

    #[error("empty catalog: the feature table has no rows")]
    EmptyCatalog,

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("unknown track: id '{id}' not present in the index")]
    UnknownTrack { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

use crate::types::ChunkFailure;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage failure during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Document '{document_id}' has no extractable text")]
    EmptyInput { document_id: String },

    #[error("None of the {attempted} chunks of '{document_id}' could be embedded")]
    NothingEmbedded {
        document_id: String,
        attempted: usize,
        failures: Vec<ChunkFailure>,
    },

    #[error("Embedding dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },
}

impl Error {
    pub fn storage<E: Into<BoxError>>(op: &'static str, err: E) -> Self {
        Error::Storage { op, source: err.into() }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize, context: impl Into<String>) -> Self {
        Error::DimensionMismatch { expected, actual, context: context.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

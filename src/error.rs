//! Error types for the search engine and its collaborators
//!
//! Each collaborator (embedder, vector index, exchange store) has its own
//! error type. `SearchError` is what callers of the public search surface see.

use thiserror::Error;

use crate::storage::ExchangeKey;

/// Failure to turn text into an embedding
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty input")]
    EmptyInput,

    #[error("embedding provider failed: {0}")]
    Provider(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failure of the underlying vector index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    #[error("query dimension mismatch: index holds {expected}-d vectors, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Embedding blob could not be decoded
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("embedding blob length {0} is not a multiple of 4 bytes")]
    InvalidLength(usize),
}

/// Failure of the exchange store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("exchange {0} not found")]
    NotFound(ExchangeKey),

    #[error("exchange store backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("corrupt embedding: {0}")]
    Codec(#[from] CodecError),
}

/// Error returned by `search_conversations` and `search_multiple_concepts`
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    IndexUnavailable(#[from] IndexError),

    /// The index returned a key the store does not know. The index and
    /// store have diverged; this is never reported as "no results".
    #[error("store consistency fault: index returned exchange {key} which is missing from the store")]
    StoreConsistency { key: ExchangeKey },

    #[error(transparent)]
    Store(StoreError),

    #[error("invalid search options: {0}")]
    InvalidOptions(String),
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => SearchError::StoreConsistency { key },
            other => SearchError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_becomes_consistency_fault() {
        let err: SearchError = StoreError::NotFound(42).into();
        assert!(matches!(err, SearchError::StoreConsistency { key: 42 }));
    }

    #[test]
    fn test_codec_error_stays_store_error() {
        let err: SearchError = StoreError::Codec(CodecError::InvalidLength(7)).into();
        assert!(matches!(err, SearchError::Store(StoreError::Codec(_))));
        assert!(err.to_string().contains("7"));
    }
}

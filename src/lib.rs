//! Semantic search over an archive of recorded conversation exchanges.
//!
//! The engine embeds a query, asks a [`index::VectorIndex`] for nearest
//! neighbours, resolves them through an [`storage::ExchangeStore`] and
//! applies an optional time window, oversampling the index until the
//! window is filled or the index is exhausted.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod search;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{EmbeddingError, IndexError, SearchError, StoreError};
pub use search::{
    ConceptSearchOptions, ConceptSearchResult, SearchEngine, SearchMode, SearchOptions,
    SearchResult,
};
pub use storage::{Archive, Exchange};

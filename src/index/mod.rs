//! Vector index abstraction
//!
//! An index answers unfiltered k-nearest-neighbour queries and nothing
//! else. Time filtering happens above it, in `search::FilteredRetriever`.

mod flat;
mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::HnswIndex;

use crate::error::IndexError;
use crate::storage::ExchangeKey;

/// One kNN hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub key: ExchangeKey,
    /// Euclidean (L2) distance to the query
    pub distance: f32,
}

/// k-nearest-neighbour search over stored embeddings
pub trait VectorIndex: Send + Sync {
    /// The `min(k, total_stored)` nearest vectors, ascending by distance
    fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;

    /// Number of vectors currently stored
    fn total_stored(&self) -> Result<usize, IndexError>;
}

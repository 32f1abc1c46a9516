//! USearch HNSW index
//!
//! Uses the squared-L2 metric; `knn` reports plain Euclidean distance so
//! scores line up with `search::similarity_from_distance`.

use anyhow::{Context, Result};
use std::path::Path;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use super::{Neighbor, VectorIndex};
use crate::error::IndexError;
use crate::storage::ExchangeKey;

const INITIAL_CAPACITY: usize = 1024;

/// Approximate nearest-neighbour index persisted as a `.usearch` file
pub struct HnswIndex {
    index: Index,
    dimension: usize,
}

impl HnswIndex {
    /// Create an empty index for `dimension`-d vectors
    pub fn new(dimension: usize) -> Result<Self> {
        let options = IndexOptions {
            dimensions: dimension,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            ..Default::default()
        };

        let index = Index::new(&options).context("Failed to create USearch index")?;
        index
            .reserve(INITIAL_CAPACITY)
            .context("Failed to reserve USearch capacity")?;

        Ok(Self { index, dimension })
    }

    /// Load an index previously written with `save`
    pub fn load(path: &Path, dimension: usize) -> Result<Self> {
        let hnsw = Self::new(dimension)?;
        hnsw.index
            .load(&path.to_string_lossy())
            .with_context(|| format!("Failed to load USearch index: {}", path.display()))?;
        Ok(hnsw)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.index
            .save(&path.to_string_lossy())
            .with_context(|| format!("Failed to save USearch index: {}", path.display()))?;
        Ok(())
    }

    /// Add a vector, growing capacity when full
    pub fn add(&self, key: ExchangeKey, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            }
            .into());
        }

        if self.index.size() >= self.index.capacity() {
            let grown = (self.index.capacity() * 2).max(INITIAL_CAPACITY);
            self.index
                .reserve(grown)
                .context("Failed to grow USearch capacity")?;
        }

        self.index
            .add(key, vector)
            .context("Failed to add vector to USearch index")?;
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl VectorIndex for HnswIndex {
    fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.index.size() == 0 {
            return Ok(Vec::new());
        }

        let matches = self
            .index
            .search(query, k)
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .map(|(&key, &squared)| Neighbor {
                key,
                distance: squared.max(0.0).sqrt(),
            })
            .collect())
    }

    fn total_stored(&self) -> Result<usize, IndexError> {
        Ok(self.index.size())
    }
}

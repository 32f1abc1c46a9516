//! Exact brute-force index
//!
//! Scans every vector per query. Results are exact, and equal distances
//! keep insertion order, which makes it the reference index for tests.

use parking_lot::RwLock;

use super::{Neighbor, VectorIndex};
use crate::embeddings::euclidean_distance;
use crate::error::IndexError;
use crate::storage::ExchangeKey;

pub struct FlatIndex {
    dimension: usize,
    vectors: RwLock<Vec<(ExchangeKey, Vec<f32>)>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, key: ExchangeKey, vector: &[f32]) -> Result<(), IndexError> {
        self.check_dimension(vector)?;
        self.vectors.write().push((key, vector.to_vec()));
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_dimension(query)?;

        let vectors = self.vectors.read();
        let mut neighbors: Vec<Neighbor> = vectors
            .iter()
            .map(|(key, vector)| Neighbor {
                key: *key,
                distance: euclidean_distance(query, vector),
            })
            .collect();

        // sort_by is stable: ties stay in insertion order
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn total_stored(&self) -> Result<usize, IndexError> {
        Ok(self.vectors.read().len())
    }
}

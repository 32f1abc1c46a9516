//! FilteredRetriever - time-filtered kNN on top of an unfiltered index
//!
//! The index only knows how to return the globally nearest k vectors.
//! Asking it for exactly `limit` and then dropping out-of-window hits
//! under-returns whenever the nearest neighbours fall outside the window,
//! so the retriever oversamples and keeps growing k until either `limit`
//! survivors are found or k covers the whole index.

use tracing::debug;

use super::filter::TimeFilter;
use crate::error::SearchError;
use crate::index::VectorIndex;
use crate::storage::{Exchange, ExchangeStore};

/// Retrieval tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Initial fetch multiplier when a time filter is active (default: 4)
    pub oversample_factor: usize,
    /// Fetch-size multiplier per growth round (default: 2)
    pub growth_factor: usize,
    /// Growth rounds before k jumps straight to the index size (default: 6)
    pub max_growth_rounds: usize,
    /// Per-concept over-fetch for multi-concept search (default: 5)
    pub concept_fetch_multiplier: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            oversample_factor: 4,
            growth_factor: 2,
            max_growth_rounds: 6,
            concept_fetch_multiplier: 5,
        }
    }
}

/// An exchange that passed the filter, with its raw index distance
#[derive(Debug, Clone)]
pub struct Candidate {
    pub exchange: Exchange,
    pub distance: f32,
}

pub struct FilteredRetriever<'a> {
    index: &'a dyn VectorIndex,
    store: &'a dyn ExchangeStore,
    config: &'a RetrievalConfig,
}

impl<'a> FilteredRetriever<'a> {
    pub fn new(
        index: &'a dyn VectorIndex,
        store: &'a dyn ExchangeStore,
        config: &'a RetrievalConfig,
    ) -> Self {
        Self {
            index,
            store,
            config,
        }
    }

    /// Up to `limit` exchanges inside `filter`, nearest first
    ///
    /// Fewer than `limit` results means the whole index was scanned and
    /// that is all the window holds.
    pub fn retrieve(
        &self,
        query: &[f32],
        filter: &TimeFilter,
        limit: usize,
    ) -> Result<Vec<Candidate>, SearchError> {
        let total = self.index.total_stored()?;
        if total == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let mut k = if filter.is_active() {
            limit.saturating_mul(self.config.oversample_factor.max(1))
        } else {
            limit
        }
        .min(total);

        let growth = self.config.growth_factor.max(2);
        let max_rounds = self.config.max_growth_rounds.max(1);
        let mut round = 0;

        loop {
            let mut candidates = self.fetch(query, filter, k)?;
            debug!(round, k, total, survivors = candidates.len(), limit, "knn round");

            if candidates.len() >= limit {
                candidates.truncate(limit);
                return Ok(candidates);
            }

            if k >= total {
                // Exhausted: every stored vector has been considered
                return Ok(candidates);
            }

            round += 1;
            k = if round >= max_rounds {
                total
            } else {
                k.saturating_mul(growth).min(total)
            };
        }
    }

    /// One kNN query, resolved through the store and filtered, in index order
    fn fetch(
        &self,
        query: &[f32],
        filter: &TimeFilter,
        k: usize,
    ) -> Result<Vec<Candidate>, SearchError> {
        let neighbors = self.index.knn(query, k)?;

        let mut candidates = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let exchange = self.store.get(neighbor.key).map_err(|err| {
                let err = SearchError::from(err);
                if let SearchError::StoreConsistency { key } = &err {
                    tracing::warn!(key, "index returned a key missing from the store");
                }
                err
            })?;

            if filter.matches(&exchange.timestamp) {
                candidates.push(Candidate {
                    exchange,
                    distance: neighbor.distance,
                });
            }
        }

        Ok(candidates)
    }
}

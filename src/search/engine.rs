//! SearchEngine - the public search surface
//!
//! Collaborators are injected; the engine holds no state of its own and
//! performs no writes, so one engine can serve concurrent callers.

use tracing::debug;

use super::concepts::MultiConceptAggregator;
use super::keyword::keyword_terms;
use super::retriever::{FilteredRetriever, RetrievalConfig};
use super::scorer::similarity_from_distance;
use super::types::{ConceptSearchOptions, ConceptSearchResult, SearchMode, SearchOptions, SearchResult};
use crate::embeddings::{euclidean_distance, EmbeddingProvider};
use crate::error::{EmbeddingError, SearchError};
use crate::index::VectorIndex;
use crate::storage::ExchangeStore;

pub struct SearchEngine<'a> {
    embedder: &'a dyn EmbeddingProvider,
    index: &'a dyn VectorIndex,
    store: &'a dyn ExchangeStore,
    config: RetrievalConfig,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        index: &'a dyn VectorIndex,
        store: &'a dyn ExchangeStore,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            config,
        }
    }

    fn retriever(&self) -> FilteredRetriever<'_> {
        FilteredRetriever::new(self.index, self.store, &self.config)
    }

    /// Exchanges most similar to `query`, best first
    pub fn search_conversations(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if options.limit == 0 {
            return Err(SearchError::InvalidOptions("limit must be positive".to_string()));
        }

        let query_vector = self.embedder.embed_query(query)?;
        let filter = options.time_filter();
        debug!(mode = %options.mode, limit = options.limit, ?filter, "search");

        let results = match options.mode {
            SearchMode::Vector => self.vector_search(&query_vector, options)?,
            SearchMode::Keyword => self.keyword_search(query, &query_vector, options)?,
            SearchMode::Hybrid => {
                let mut results = self.vector_search(&query_vector, options)?;
                for hit in self.keyword_search(query, &query_vector, options)? {
                    if !results.iter().any(|r| r.exchange.key == hit.exchange.key) {
                        results.push(hit);
                    }
                }
                sort_by_similarity(&mut results);
                results.truncate(options.limit);
                results
            }
        };

        Ok(results)
    }

    /// Exchanges relevant to all `concepts` jointly, ranked by mean similarity
    pub fn search_multiple_concepts(
        &self,
        concepts: &[String],
        options: &ConceptSearchOptions,
    ) -> Result<Vec<ConceptSearchResult>, SearchError> {
        if concepts.is_empty() {
            return Err(SearchError::InvalidOptions("at least one concept is required".to_string()));
        }
        if options.limit == 0 {
            return Err(SearchError::InvalidOptions("limit must be positive".to_string()));
        }

        let aggregator = MultiConceptAggregator::new(self.embedder, self.retriever(), &self.config);
        aggregator.search(concepts, &options.time_filter(), options.limit)
    }

    fn vector_search(
        &self,
        query_vector: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let candidates = self
            .retriever()
            .retrieve(query_vector, &options.time_filter(), options.limit)?;

        Ok(candidates
            .into_iter()
            .map(|c| SearchResult {
                similarity: similarity_from_distance(c.distance),
                exchange: c.exchange,
            })
            .collect())
    }

    /// Text matches, scored against the query embedding so every result
    /// carries a comparable similarity
    fn keyword_search(
        &self,
        query: &str,
        query_vector: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let terms = keyword_terms(query);
        let exchanges = self
            .store
            .search_text(&terms, &options.time_filter(), options.limit)?;

        let mut results = Vec::with_capacity(exchanges.len());
        for exchange in exchanges {
            if exchange.embedding.len() != query_vector.len() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: exchange.embedding.len(),
                    actual: query_vector.len(),
                }
                .into());
            }
            let distance = euclidean_distance(query_vector, &exchange.embedding);
            results.push(SearchResult {
                similarity: similarity_from_distance(distance),
                exchange,
            });
        }

        sort_by_similarity(&mut results);
        Ok(results)
    }
}

/// Stable: equal similarities keep their incoming order
fn sort_by_similarity(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
}

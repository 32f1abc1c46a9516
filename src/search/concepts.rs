//! MultiConceptAggregator - rank exchanges against several concepts at once
//!
//! Each concept is embedded and retrieved on its own (in parallel), then
//! the per-concept hits are merged by exchange and ranked by the mean of
//! their per-concept similarities.

use rayon::prelude::*;
use std::collections::HashMap;

use super::filter::TimeFilter;
use super::retriever::{Candidate, FilteredRetriever, RetrievalConfig};
use super::scorer::similarity_from_distance;
use super::types::ConceptSearchResult;
use crate::embeddings::EmbeddingProvider;
use crate::error::SearchError;
use crate::storage::{Exchange, ExchangeKey};

pub struct MultiConceptAggregator<'a> {
    embedder: &'a dyn EmbeddingProvider,
    retriever: FilteredRetriever<'a>,
    config: &'a RetrievalConfig,
}

impl<'a> MultiConceptAggregator<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        retriever: FilteredRetriever<'a>,
        config: &'a RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            retriever,
            config,
        }
    }

    pub fn search(
        &self,
        concepts: &[String],
        filter: &TimeFilter,
        limit: usize,
    ) -> Result<Vec<ConceptSearchResult>, SearchError> {
        // Merging across concepts shrinks the useful pool, so over-fetch
        let fetch = limit.saturating_mul(self.config.concept_fetch_multiplier.max(1));

        let per_concept: Vec<Vec<Candidate>> = concepts
            .par_iter()
            .map(|concept| {
                let query = self.embedder.embed_query(concept)?;
                self.retriever.retrieve(&query, filter, fetch)
            })
            .collect::<Result<_, SearchError>>()?;

        let mut results = merge(per_concept, concepts.len());
        results.truncate(limit);
        Ok(results)
    }
}

/// Union of per-concept hits; a concept that did not retrieve an exchange
/// contributes 0 to its `concept_similarities`
fn merge(per_concept: Vec<Vec<Candidate>>, concept_count: usize) -> Vec<ConceptSearchResult> {
    let mut merged: HashMap<ExchangeKey, (Exchange, Vec<f32>)> = HashMap::new();

    for (concept, candidates) in per_concept.into_iter().enumerate() {
        for candidate in candidates {
            let similarity = similarity_from_distance(candidate.distance);
            let entry = merged
                .entry(candidate.exchange.key)
                .or_insert_with(|| (candidate.exchange, vec![0.0; concept_count]));
            entry.1[concept] = similarity;
        }
    }

    let mut results: Vec<ConceptSearchResult> = merged
        .into_values()
        .map(|(exchange, concept_similarities)| {
            let average_similarity = mean(&concept_similarities);
            ConceptSearchResult {
                exchange,
                concept_similarities,
                average_similarity,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.average_similarity
            .total_cmp(&a.average_similarity)
            .then_with(|| a.exchange.timestamp.cmp(&b.exchange.timestamp))
            .then_with(|| a.exchange.key.cmp(&b.exchange.key))
    });
    results
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

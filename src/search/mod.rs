//! Search module - time-filtered semantic retrieval over the archive
//!
//! Public interface:
//! - `SearchEngine` with `search_conversations` and `search_multiple_concepts`
//! - `SearchOptions` / `ConceptSearchOptions` and their result types
//! - `similarity_from_distance` for turning index distances into scores
//!
//! `FilteredRetriever` and `MultiConceptAggregator` are exported for callers
//! that bring their own embedding step.

mod concepts;
mod engine;
mod filter;
mod keyword;
mod retriever;
mod scorer;
mod types;

pub use concepts::MultiConceptAggregator;
pub use engine::SearchEngine;
pub use filter::TimeFilter;
pub use keyword::keyword_terms;
pub use retriever::{Candidate, FilteredRetriever, RetrievalConfig};
pub use scorer::similarity_from_distance;
pub use types::{
    ConceptSearchOptions, ConceptSearchResult, SearchMode, SearchOptions, SearchResult,
};

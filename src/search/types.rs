//! Search options and result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::filter::TimeFilter;
use crate::storage::Exchange;

/// How candidates are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Nearest neighbours of the query embedding
    #[default]
    Vector,
    /// Full-text term match
    Keyword,
    /// Union of vector and keyword candidates
    Hybrid,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Vector => "vector",
            SearchMode::Keyword => "keyword",
            SearchMode::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vector" => Ok(SearchMode::Vector),
            "keyword" | "text" => Ok(SearchMode::Keyword),
            "hybrid" | "both" => Ok(SearchMode::Hybrid),
            other => Err(format!(
                "unknown search mode '{}' (expected vector, keyword or hybrid)",
                other
            )),
        }
    }
}

/// Options for `search_conversations`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
    pub mode: SearchMode,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            mode: SearchMode::Vector,
            after: None,
            before: None,
        }
    }
}

impl SearchOptions {
    pub fn time_filter(&self) -> TimeFilter {
        TimeFilter::new(self.after.clone(), self.before.clone())
    }
}

/// Options for `search_multiple_concepts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptSearchOptions {
    pub limit: usize,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl Default for ConceptSearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            after: None,
            before: None,
        }
    }
}

impl ConceptSearchOptions {
    pub fn time_filter(&self) -> TimeFilter {
        TimeFilter::new(self.after.clone(), self.before.clone())
    }
}

/// A single-query hit
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub exchange: Exchange,
    /// In [0, 1]; results are ordered by this, descending
    pub similarity: f32,
}

/// A multi-concept hit
#[derive(Debug, Clone, Serialize)]
pub struct ConceptSearchResult {
    pub exchange: Exchange,
    /// One entry per input concept, in input order; 0 where the exchange
    /// was not retrieved for that concept
    pub concept_similarities: Vec<f32>,
    /// Mean of `concept_similarities`
    pub average_similarity: f32,
}

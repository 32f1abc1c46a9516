//! Query preparation for keyword search
//!
//! Reduces a natural-language query to the words worth matching: lowercase
//! alphanumeric tokens, stop words removed, duplicates dropped, order kept.

use std::collections::HashSet;

/// Words that match almost every exchange and carry no topic
const STOP_WORDS: &[&str] = &[
    // Question words
    "how", "what", "why", "when", "where", "which", "who",
    // Auxiliaries and common verbs
    "does", "do", "did", "is", "are", "was", "were", "be", "been", "can", "could",
    "will", "would", "should", "have", "has", "had",
    // Articles, pronouns, prepositions
    "a", "an", "the", "this", "that", "these", "those", "i", "we", "you", "it",
    "my", "our", "your", "to", "of", "in", "on", "for", "with", "about", "at",
    "by", "from", "and", "or", "not",
];

/// Extract search terms from a query
///
/// If every word is a stop word the unfiltered words are returned instead,
/// so a query like "what is this" still matches something.
pub fn keyword_terms(query: &str) -> Vec<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    let words: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let mut seen = HashSet::new();
    let terms: Vec<String> = words
        .iter()
        .filter(|w| !stop_words.contains(w.as_str()))
        .filter(|w| seen.insert(w.to_string()))
        .cloned()
        .collect();

    if !terms.is_empty() {
        return terms;
    }

    let mut seen = HashSet::new();
    words.into_iter().filter(|w| seen.insert(w.clone())).collect()
}

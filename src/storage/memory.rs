//! In-memory exchange store

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::types::{Exchange, ExchangeKey, NewExchange};
use super::ExchangeStore;
use crate::error::StoreError;
use crate::search::TimeFilter;

/// Exchange store held entirely in memory, keyed in insertion order
#[derive(Default)]
pub struct MemoryExchangeStore {
    exchanges: RwLock<BTreeMap<ExchangeKey, Exchange>>,
}

impl MemoryExchangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an exchange under the next free key
    pub fn insert(&self, exchange: NewExchange) -> ExchangeKey {
        let mut exchanges = self.exchanges.write();
        let key = exchanges.keys().next_back().map_or(1, |last| last + 1);
        exchanges.insert(key, exchange.into_exchange(key));
        key
    }

    /// Insert an exchange under a caller-chosen key, replacing any previous one
    pub fn insert_with_key(&self, exchange: Exchange) {
        self.exchanges.write().insert(exchange.key, exchange);
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

impl ExchangeStore for MemoryExchangeStore {
    fn get(&self, key: ExchangeKey) -> Result<Exchange, StoreError> {
        self.exchanges
            .read()
            .get(&key)
            .cloned()
            .ok_or(StoreError::NotFound(key))
    }

    fn search_text(
        &self,
        terms: &[String],
        filter: &TimeFilter,
        limit: usize,
    ) -> Result<Vec<Exchange>, StoreError> {
        let exchanges = self.exchanges.read();

        // (matched term count, exchange); BTreeMap order keeps ties by key
        let mut hits: Vec<(usize, &Exchange)> = exchanges
            .values()
            .filter(|e| filter.matches(&e.timestamp))
            .filter_map(|e| {
                let text_words = words(&e.text);
                let matched = terms.iter().filter(|t| text_words.contains(t)).count();
                (matched > 0).then_some((matched, e))
            })
            .collect();

        hits.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(hits.into_iter().take(limit).map(|(_, e)| e.clone()).collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.exchanges.read().len())
    }
}

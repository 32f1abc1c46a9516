//! Domain types for the storage layer
//!
//! These types are storage-agnostic - they don't know about SQLite or USearch.

use serde::{Deserialize, Serialize};

/// Key shared by the exchange store and the vector index (the SQLite rowid)
pub type ExchangeKey = u64;

/// One recorded user/assistant exchange, immutable once ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub key: ExchangeKey,
    pub id: String,
    pub conversation_id: String,
    /// ISO-8601, compared lexically
    pub timestamp: String,
    pub text: String,
    #[serde(skip_serializing, default)]
    pub embedding: Vec<f32>,
}

/// An exchange not yet assigned a key
#[derive(Debug, Clone)]
pub struct NewExchange {
    pub id: String,
    pub conversation_id: String,
    pub timestamp: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl NewExchange {
    pub fn into_exchange(self, key: ExchangeKey) -> Exchange {
        Exchange {
            key,
            id: self.id,
            conversation_id: self.conversation_id,
            timestamp: self.timestamp,
            text: self.text,
            embedding: self.embedding,
        }
    }
}

//! Storage layer - SQLite + USearch hybrid storage
//!
//! - SQLite holds the exchanges themselves (source of truth, FTS5 text index)
//! - USearch holds the embeddings for approximate nearest-neighbour search
//!
//! `Archive` owns both and keeps them in step. The search engine only sees
//! them through the `ExchangeStore` and `VectorIndex` traits.
//!
//! # Example
//!
//! ```no_run
//! use episodic::storage::Archive;
//!
//! let archive = Archive::open("/tmp/episodic", 384)?;
//! println!("{} exchanges", archive.count()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod archive;
pub mod memory;
pub mod sqlite;
pub mod types;

pub use archive::Archive;
pub use memory::MemoryExchangeStore;
pub use sqlite::SqliteExchangeStore;
pub use types::{Exchange, ExchangeKey, NewExchange};

use crate::error::StoreError;
use crate::search::TimeFilter;

/// Read access to stored exchanges
pub trait ExchangeStore: Send + Sync {
    /// Look up an exchange by key. Missing keys are `StoreError::NotFound`.
    fn get(&self, key: ExchangeKey) -> Result<Exchange, StoreError>;

    /// Exchanges whose text contains any of `terms` (lowercase words),
    /// restricted to the time window, best matches first
    fn search_text(
        &self,
        terms: &[String],
        filter: &TimeFilter,
        limit: usize,
    ) -> Result<Vec<Exchange>, StoreError>;

    /// Number of stored exchanges
    fn count(&self) -> Result<usize, StoreError>;
}

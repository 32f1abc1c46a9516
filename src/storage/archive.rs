//! Archive - dual storage for exchanges: SQLite + USearch
//!
//! SQLite is the source of truth (exchange rows and their embeddings).
//! The USearch index is derived data: when its file is missing or out of
//! step with SQLite it is rebuilt from the stored embeddings.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::sqlite::SqliteExchangeStore;
use super::types::{ExchangeKey, NewExchange};
use super::ExchangeStore;
use crate::index::{HnswIndex, VectorIndex};

const DB_FILE: &str = "exchanges.db";
const INDEX_FILE: &str = "exchanges.usearch";

pub struct Archive {
    store: SqliteExchangeStore,
    vectors: HnswIndex,
    index_path: PathBuf,
}

impl Archive {
    /// Open or create an archive at the given directory
    ///
    /// Creates two files:
    /// - `{path}/exchanges.db` - SQLite database
    /// - `{path}/exchanges.usearch` - USearch vector index
    pub fn open<P: AsRef<Path>>(path: P, dimension: usize) -> Result<Self> {
        let base = path.as_ref();
        std::fs::create_dir_all(base)
            .with_context(|| format!("Failed to create archive directory: {}", base.display()))?;

        let store = SqliteExchangeStore::open(base.join(DB_FILE))
            .context("Failed to open exchange database")?;
        let index_path = base.join(INDEX_FILE);

        let vectors = if index_path.exists() {
            HnswIndex::load(&index_path, dimension)?
        } else {
            HnswIndex::new(dimension)?
        };

        let mut archive = Self {
            store,
            vectors,
            index_path,
        };

        let stored = archive.store.count()?;
        let indexed = archive.vectors.total_stored()?;
        if stored != indexed {
            warn!(
                stored,
                indexed, "vector index out of step with exchange store, rebuilding"
            );
            archive.rebuild_index()?;
        }

        info!(path = %base.display(), exchanges = stored, "opened archive");
        Ok(archive)
    }

    /// Insert an exchange into SQLite, then the vector index
    ///
    /// Returns `None` when an exchange with the same id is already archived.
    /// Call `save` to persist the index.
    pub fn insert(&mut self, exchange: &NewExchange) -> Result<Option<ExchangeKey>> {
        let Some(key) = self.store.insert(exchange)? else {
            return Ok(None);
        };

        self.vectors
            .add(key, &exchange.embedding)
            .with_context(|| format!("Failed to index exchange {}", exchange.id))?;
        Ok(Some(key))
    }

    /// Rebuild the vector index from embeddings stored in SQLite
    pub fn rebuild_index(&mut self) -> Result<usize> {
        let vectors = HnswIndex::new(self.vectors.dimension())?;
        let embeddings = self.store.embeddings()?;
        for (key, embedding) in &embeddings {
            vectors
                .add(*key, embedding)
                .with_context(|| format!("Failed to index exchange key {}", key))?;
        }

        self.vectors = vectors;
        self.save()?;
        info!(vectors = embeddings.len(), "rebuilt vector index");
        Ok(embeddings.len())
    }

    /// Persist the vector index to disk
    pub fn save(&self) -> Result<()> {
        self.vectors.save(&self.index_path)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.store.count()?)
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    pub fn store(&self) -> &SqliteExchangeStore {
        &self.store
    }

    pub fn index(&self) -> &HnswIndex {
        &self.vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_exchange(id: &str, embedding: Vec<f32>) -> NewExchange {
        NewExchange {
            id: id.to_string(),
            conversation_id: "conv".to_string(),
            timestamp: "2025-01-01T00:00:00.000Z".to_string(),
            text: format!("exchange {}", id),
            embedding,
        }
    }

    #[test]
    fn test_archive_creation() -> Result<()> {
        let temp = TempDir::new()?;
        let archive = Archive::open(temp.path(), 3)?;
        assert_eq!(archive.count()?, 0);
        assert_eq!(archive.index().total_stored()?, 0);
        Ok(())
    }

    #[test]
    fn test_insert_keeps_store_and_index_in_step() -> Result<()> {
        let temp = TempDir::new()?;
        let mut archive = Archive::open(temp.path(), 3)?;

        let key = archive.insert(&new_exchange("a", vec![1.0, 0.0, 0.0]))?.unwrap();
        assert!(archive.insert(&new_exchange("a", vec![1.0, 0.0, 0.0]))?.is_none());
        archive.insert(&new_exchange("b", vec![0.0, 1.0, 0.0]))?;

        assert_eq!(archive.count()?, 2);
        assert_eq!(archive.index().total_stored()?, 2);
        assert_eq!(archive.index().knn(&[1.0, 0.0, 0.0], 1)?[0].key, key);
        Ok(())
    }

    #[test]
    fn test_reopen_rebuilds_missing_index() -> Result<()> {
        let temp = TempDir::new()?;
        {
            let mut archive = Archive::open(temp.path(), 3)?;
            archive.insert(&new_exchange("a", vec![1.0, 0.0, 0.0]))?;
            archive.insert(&new_exchange("b", vec![0.0, 1.0, 0.0]))?;
            // index deliberately not saved
        }

        let archive = Archive::open(temp.path(), 3)?;
        assert_eq!(archive.index().total_stored()?, 2);
        assert!(temp.path().join(INDEX_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_reopen_loads_saved_index() -> Result<()> {
        let temp = TempDir::new()?;
        {
            let mut archive = Archive::open(temp.path(), 3)?;
            archive.insert(&new_exchange("a", vec![0.0, 0.0, 1.0]))?;
            archive.save()?;
        }

        let archive = Archive::open(temp.path(), 3)?;
        let hit = archive.index().knn(&[0.0, 0.0, 1.0], 1)?;
        assert_eq!(archive.store().get(hit[0].key)?.id, "a");
        Ok(())
    }
}

//! SQLite exchange store
//!
//! Exchanges live in `exchanges`; `exchanges_fts` is an external-content
//! FTS5 table over the text, populated in the same transaction as the row.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::types::{Exchange, ExchangeKey, NewExchange};
use super::ExchangeStore;
use crate::embeddings::{decode_embedding, encode_embedding};
use crate::error::StoreError;
use crate::search::TimeFilter;

const SELECT_COLUMNS: &str = "e.rowid, e.id, e.conversation_id, e.timestamp, e.text, e.embedding";

/// Exchange store backed by a SQLite database
///
/// `rusqlite::Connection` is not `Sync`; the mutex lets one store serve
/// parallel per-concept retrievals.
pub struct SqliteExchangeStore {
    db: Mutex<Connection>,
}

impl SqliteExchangeStore {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Connection::open(path)?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// In-memory database (tests, scratch archives)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory()?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn init_schema(db: &Connection) -> Result<(), StoreError> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS exchanges (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                conversation_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_exchanges_timestamp ON exchanges(timestamp);
            CREATE INDEX IF NOT EXISTS idx_exchanges_conversation ON exchanges(conversation_id);
            CREATE VIRTUAL TABLE IF NOT EXISTS exchanges_fts USING fts5(
                text,
                content='exchanges',
                content_rowid='rowid'
            );",
        )?;
        Ok(())
    }

    /// Insert an exchange, returning its key
    ///
    /// Exchanges are immutable: re-inserting an existing `id` is a no-op
    /// and returns `None`.
    pub fn insert(&self, exchange: &NewExchange) -> Result<Option<ExchangeKey>, StoreError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;

        let rowid: Option<i64> = tx
            .query_row(
                "INSERT INTO exchanges (id, conversation_id, timestamp, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO NOTHING
                 RETURNING rowid",
                params![
                    &exchange.id,
                    &exchange.conversation_id,
                    &exchange.timestamp,
                    &exchange.text,
                    encode_embedding(&exchange.embedding),
                ],
                |row| row.get(0),
            )
            .optional()?;

        let Some(rowid) = rowid else {
            return Ok(None);
        };

        tx.execute(
            "INSERT INTO exchanges_fts (rowid, text) VALUES (?1, ?2)",
            params![rowid, &exchange.text],
        )?;
        tx.commit()?;

        Ok(Some(rowid as ExchangeKey))
    }

    /// All stored (key, embedding) pairs in key order, for index rebuilds
    pub fn embeddings(&self) -> Result<Vec<(ExchangeKey, Vec<f32>)>, StoreError> {
        let db = self.db.lock();
        let mut stmt = db.prepare("SELECT rowid, embedding FROM exchanges ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(rowid, blob)| Ok((rowid as ExchangeKey, decode_embedding(&blob)?)))
            .collect()
    }

    /// Timestamp range covered by the archive
    pub fn time_span(&self) -> Result<Option<(String, String)>, StoreError> {
        let db = self.db.lock();
        let span: (Option<String>, Option<String>) = db.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM exchanges",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match span {
            (Some(first), Some(last)) => Some((first, last)),
            _ => None,
        })
    }
}

/// Map a selected row (see `SELECT_COLUMNS`) to an exchange
fn row_to_exchange(row: &Row<'_>) -> rusqlite::Result<(Exchange, Vec<u8>)> {
    let rowid: i64 = row.get(0)?;
    Ok((
        Exchange {
            key: rowid as ExchangeKey,
            id: row.get(1)?,
            conversation_id: row.get(2)?,
            timestamp: row.get(3)?,
            text: row.get(4)?,
            embedding: Vec::new(),
        },
        row.get(5)?,
    ))
}

fn with_embedding((mut exchange, blob): (Exchange, Vec<u8>)) -> Result<Exchange, StoreError> {
    exchange.embedding = decode_embedding(&blob)?;
    Ok(exchange)
}

/// FTS5 MATCH expression: every term quoted, OR-joined
fn fts_expression(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

impl ExchangeStore for SqliteExchangeStore {
    fn get(&self, key: ExchangeKey) -> Result<Exchange, StoreError> {
        let db = self.db.lock();
        let sql = format!("SELECT {} FROM exchanges e WHERE e.rowid = ?1", SELECT_COLUMNS);
        let row = db
            .query_row(&sql, params![key as i64], row_to_exchange)
            .optional()?;

        match row {
            Some(row) => with_embedding(row),
            None => Err(StoreError::NotFound(key)),
        }
    }

    fn search_text(
        &self,
        terms: &[String],
        filter: &TimeFilter,
        limit: usize,
    ) -> Result<Vec<Exchange>, StoreError> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let db = self.db.lock();
        let sql = format!(
            "SELECT {} FROM exchanges_fts
             JOIN exchanges e ON e.rowid = exchanges_fts.rowid
             WHERE exchanges_fts MATCH ?1
               AND (?2 IS NULL OR e.timestamp >= ?2)
               AND (?3 IS NULL OR e.timestamp <= ?3)
             ORDER BY bm25(exchanges_fts), e.rowid
             LIMIT ?4",
            SELECT_COLUMNS
        );

        let mut stmt = db.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    fts_expression(terms),
                    filter.after.as_deref(),
                    filter.before.as_deref(),
                    limit as i64
                ],
                row_to_exchange,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(with_embedding).collect()
    }

    fn count(&self) -> Result<usize, StoreError> {
        let db = self.db.lock();
        let count: i64 = db.query_row("SELECT COUNT(*) FROM exchanges", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

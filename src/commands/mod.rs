pub mod concepts;
pub mod import;
pub mod index;
pub mod search;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, NaiveDate};
use std::path::{Path, PathBuf};

use episodic::embeddings::{create_provider, EmbeddingProvider};
use episodic::storage::Archive;
use episodic::Config;

/// Resolved configuration shared by every command
pub struct Context {
    pub config: Config,
    pub storage_path: PathBuf,
}

impl Context {
    /// Load config from `config_path` (or the default location) and apply
    /// the `--db` override
    pub fn load(config_path: Option<&Path>, db: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Config::load(path)?
            }
            None => match Config::default_path() {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            },
        };

        let storage_path = db.unwrap_or_else(|| config.storage.path());
        Ok(Self {
            config,
            storage_path,
        })
    }

    pub fn open_archive(&self) -> Result<Archive> {
        Archive::open(&self.storage_path, self.config.embeddings.dimension).with_context(|| {
            format!("Failed to open archive at {}", self.storage_path.display())
        })
    }

    pub fn embedder(&self) -> Result<Box<dyn EmbeddingProvider>> {
        create_provider(&self.config.embeddings).context("Failed to create embedding provider")
    }
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp; the string itself is
/// passed on unchanged
pub fn validate_date_bound(flag: &str, value: Option<String>) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let is_date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_ok();
    let is_timestamp = DateTime::parse_from_rfc3339(&value).is_ok();
    if !is_date && !is_timestamp {
        bail!(
            "--{} expects YYYY-MM-DD or an RFC 3339 timestamp, got '{}'",
            flag,
            value
        );
    }
    Ok(Some(value))
}

/// Single-line preview of exchange text
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

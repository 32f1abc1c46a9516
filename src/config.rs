//! Configuration for episodic-memory
//!
//! Loaded from a TOML file whose location is chosen by the caller. Every
//! section falls back to defaults, so a missing file is a valid config.
//!
//! ```toml
//! [storage]
//! path = "~/.local/share/episodic-memory"
//!
//! [embeddings]
//! provider = "onnx"
//! model_dir = "~/.cache/episodic-memory/models/all-minilm-l6-v2"
//!
//! [search]
//! oversample_factor = 4
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::RetrievalConfig;

const APP_DIR: &str = "episodic-memory";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Where the archive lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding exchanges.db and exchanges.usearch
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".episodic"));
        Self {
            path: path.to_string_lossy().into_owned(),
        }
    }
}

impl StorageConfig {
    /// Storage directory with `~` and `$VARS` expanded
    pub fn path(&self) -> PathBuf {
        expand_path(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Onnx,
    Hashing,
}

/// Embedding model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub provider: EmbeddingProviderKind,
    /// Directory containing model.onnx (or model_quantized.onnx) and tokenizer.json
    pub model_dir: String,
    pub model_name: String,
    pub dimension: usize,
    /// Query prefix for asymmetric models (e.g. "query: " for E5)
    pub query_prefix: Option<String>,
    /// Passage prefix for asymmetric models (e.g. "passage: " for E5)
    pub passage_prefix: Option<String>,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        let model_dir = dirs::cache_dir()
            .map(|d| d.join(APP_DIR).join("models").join("all-minilm-l6-v2"))
            .unwrap_or_else(|| PathBuf::from("resources/models/all-minilm-l6-v2"));
        Self {
            provider: EmbeddingProviderKind::default(),
            model_dir: model_dir.to_string_lossy().into_owned(),
            model_name: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            query_prefix: None,
            passage_prefix: None,
        }
    }
}

impl EmbeddingsConfig {
    pub fn model_dir(&self) -> PathBuf {
        expand_path(&self.model_dir)
    }
}

/// Retrieval tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub oversample_factor: usize,
    pub growth_factor: usize,
    pub max_growth_rounds: usize,
    pub concept_fetch_multiplier: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let retrieval = RetrievalConfig::default();
        Self {
            default_limit: 10,
            oversample_factor: retrieval.oversample_factor,
            growth_factor: retrieval.growth_factor,
            max_growth_rounds: retrieval.max_growth_rounds,
            concept_fetch_multiplier: retrieval.concept_fetch_multiplier,
        }
    }
}

impl SearchConfig {
    /// Retrieval parameters handed to the search engine
    pub fn retrieval(&self) -> RetrievalConfig {
        RetrievalConfig {
            oversample_factor: self.oversample_factor.max(1),
            growth_factor: self.growth_factor.max(2),
            max_growth_rounds: self.max_growth_rounds.max(1),
            concept_fetch_multiplier: self.concept_fetch_multiplier.max(1),
        }
    }
}

impl Config {
    /// Default config file location: `<config_dir>/episodic-memory/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration from a TOML file, using defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }
}

fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(raw),
    }
}

//! Embeddings module - Generate semantic embeddings for text
//!
//! Provides trait-based abstraction for embedding generation. The ONNX
//! backend runs a sentence-transformer model; the hashing backend is a
//! deterministic bag-of-words fallback that needs no model files.

mod codec;
mod hashing;
mod onnx;
mod similarity;

pub use codec::{decode_embedding, encode_embedding};
pub use hashing::HashingEmbedder;
pub use onnx::OnnxEmbedder;
pub use similarity::{cosine_similarity, euclidean_distance, l2_normalize};

use anyhow::{Context, Result};

use crate::config::{EmbeddingProviderKind, EmbeddingsConfig};
use crate::error::EmbeddingError;

/// Trait for embedding generation engines
///
/// Implementations must be deterministic and return unit-length vectors.
/// Requires `Send + Sync` so per-concept retrievals can share one provider
/// across rayon workers.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embedding for a query text (with model-specific prefix if needed)
    ///
    /// For symmetric models this is identical to `embed()`.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(text)
    }

    /// Generate embedding for a stored exchange (with model-specific prefix if needed)
    fn embed_passage(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(text)
    }

    /// Embedding dimension (e.g. 384 for all-MiniLM-L6-v2)
    fn dimension(&self) -> usize;

    /// Model name
    fn model_name(&self) -> &str;
}

/// Create the embedding provider described by the configuration
pub fn create_provider(config: &EmbeddingsConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::Hashing => Ok(Box::new(HashingEmbedder::new(config.dimension))),
        EmbeddingProviderKind::Onnx => {
            let model_dir = config.model_dir();

            // Prefer the quantized model when present
            let quantized = model_dir.join("model_quantized.onnx");
            let model_path = if quantized.exists() {
                quantized
            } else {
                model_dir.join("model.onnx")
            };
            let tokenizer_path = model_dir.join("tokenizer.json");

            let embedder = OnnxEmbedder::new_from_paths(
                &model_path,
                &tokenizer_path,
                &config.model_name,
                config.dimension,
                config.query_prefix.clone(),
                config.passage_prefix.clone(),
            )
            .with_context(|| format!("Failed to load ONNX model from {}", model_dir.display()))?;

            Ok(Box::new(embedder))
        }
    }
}

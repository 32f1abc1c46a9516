//! ONNX Runtime embedder for sentence-transformer models (all-MiniLM-L6-v2 and friends)

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;
use ort::{inputs, session::Session, value::Value};
use parking_lot::Mutex;
use std::path::Path;
use tokenizers::Tokenizer;

use super::similarity::l2_normalize;
use super::EmbeddingProvider;
use crate::error::EmbeddingError;

/// ONNX model input limit for minilm/bge/e5
const MAX_TOKENS: usize = 512;

/// ONNX-based embedding generator
///
/// The session needs exclusive access while running; it sits behind a
/// mutex so the embedder itself can be shared between threads.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
    model_name: String,
    query_prefix: Option<String>,
    passage_prefix: Option<String>,
}

impl OnnxEmbedder {
    /// Create a new ONNX embedder from model and tokenizer paths
    ///
    /// # Arguments
    /// * `model_path` - Path to ONNX model file
    /// * `tokenizer_path` - Path to tokenizer.json file
    /// * `model_name` - Human-readable model name
    /// * `dimension` - Embedding dimension (384 for small models, 768 for base models)
    /// * `query_prefix` - Optional prefix for query embeddings (asymmetric models)
    /// * `passage_prefix` - Optional prefix for passage embeddings (asymmetric models)
    pub fn new_from_paths(
        model_path: &Path,
        tokenizer_path: &Path,
        model_name: &str,
        dimension: usize,
        query_prefix: Option<String>,
        passage_prefix: Option<String>,
    ) -> Result<Self> {
        if !model_path.exists() {
            bail!(
                "ONNX model not found at: {}\n\n\
                Download it with:\n  \
                curl -L --create-dirs -o {} \\\n  \
                https://huggingface.co/Xenova/all-MiniLM-L6-v2/resolve/main/onnx/model_quantized.onnx",
                model_path.display(),
                model_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(model_path)
            .context("Failed to load ONNX model")?;

        if !tokenizer_path.exists() {
            bail!(
                "Tokenizer not found at: {}\n\n\
                Download it with:\n  \
                curl -L --create-dirs -o {} \\\n  \
                https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json",
                tokenizer_path.display(),
                tokenizer_path.display()
            );
        }

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        // Long exchanges would otherwise overflow the model's position embeddings
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimension,
            model_name: model_name.to_string(),
            query_prefix,
            passage_prefix,
        })
    }

    /// Tokenize text into input_ids and attention_mask
    fn tokenize(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>), EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Provider(format!("tokenization failed: {}", e)))?;

        let input_ids = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let attention_mask = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();

        Ok((input_ids, attention_mask))
    }

    /// Run the model and return the token embeddings of the single batch item
    fn infer(&self, input_ids: Vec<i64>, attention_mask: &[i64]) -> Result<Array2<f32>> {
        let seq_len = input_ids.len();
        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.to_vec())
            .context("Failed to create attention_mask array")?;
        let token_type_ids_array = Array2::from_shape_vec((1, seq_len), vec![0i64; seq_len])
            .context("Failed to create token_type_ids array")?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![
                "input_ids" => Value::from_array(input_ids_array)?,
                "attention_mask" => Value::from_array(attention_mask_array)?,
                "token_type_ids" => Value::from_array(token_type_ids_array)?
            ])
            .context("ONNX inference failed")?;

        let (shape, data) = outputs["last_hidden_state"]
            .try_extract_tensor::<f32>()
            .context("Failed to extract last_hidden_state tensor")?;

        // [batch_size=1, seq_len, hidden_dim]
        let shape_dims = shape.as_ref();
        if shape_dims.len() != 3 {
            bail!("Expected 3D tensor, got shape: {:?}", shape_dims);
        }

        let seq_len = shape_dims[1] as usize;
        let hidden_dim = shape_dims[2] as usize;
        let batch_offset = seq_len * hidden_dim;

        let token_embeddings =
            Array2::from_shape_vec((seq_len, hidden_dim), data[0..batch_offset].to_vec())
                .context("Failed to reshape token embeddings")?;
        Ok(token_embeddings)
    }

    /// Mean pooling - average token embeddings weighted by attention mask
    fn mean_pooling(&self, token_embeddings: &Array2<f32>, attention_mask: &[i64]) -> Vec<f32> {
        let mask_sum: f32 = attention_mask.iter().map(|&x| x as f32).sum();
        if mask_sum == 0.0 {
            return vec![0.0; self.dimension];
        }

        let mut pooled = vec![0.0; self.dimension];
        for (i, &mask) in attention_mask.iter().enumerate() {
            if mask == 1 && i < token_embeddings.nrows() {
                for (j, slot) in pooled.iter_mut().enumerate() {
                    *slot += token_embeddings[[i, j]];
                }
            }
        }

        pooled.iter().map(|&x| x / mask_sum).collect()
    }

    fn with_prefix(prefix: &Option<String>, text: &str) -> String {
        match prefix {
            Some(prefix) => format!("{}{}", prefix, text),
            None => text.to_string(),
        }
    }
}

impl EmbeddingProvider for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let (input_ids, attention_mask) = self.tokenize(text)?;
        let token_embeddings = self
            .infer(input_ids, &attention_mask)
            .map_err(|e| EmbeddingError::Provider(format!("{:#}", e)))?;

        if token_embeddings.ncols() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: token_embeddings.ncols(),
            });
        }

        let mut embedding = self.mean_pooling(&token_embeddings, &attention_mask);
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        self.embed(&Self::with_prefix(&self.query_prefix, text))
    }

    fn embed_passage(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        self.embed(&Self::with_prefix(&self.passage_prefix, text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

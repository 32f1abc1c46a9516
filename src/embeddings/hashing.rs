//! Feature-hashing embedder
//!
//! Maps lowercase alphanumeric tokens into signed buckets and L2-normalises
//! the result. Texts sharing vocabulary land close together; texts with no
//! shared tokens are (up to bucket collisions) orthogonal. Requires no
//! model files, which makes it the provider of choice for tests.

use super::similarity::l2_normalize;
use super::EmbeddingProvider;
use crate::error::EmbeddingError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

/// FNV-1a; stable across platforms and releases, unlike `DefaultHasher`
fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vec = vec![0.0f32; self.dimension];
        let mut seen = 0usize;

        for token in tokens(text) {
            let hash = fnv1a(&token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vec[bucket] += sign;
            seen += 1;
        }

        if seen == 0 {
            return Err(EmbeddingError::EmptyInput);
        }

        l2_normalize(&mut vec);
        Ok(vec)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

//! Local embedding provider based on feature hashing.
//!
//! [`HashingEmbedder`] needs no model download and no network. Each
//! lower-cased alphanumeric token is hashed into one of `dimensions`
//! buckets with a hash-derived sign, and the resulting vector is
//! L2-normalized. Texts sharing vocabulary end up with high cosine
//! similarity, which is enough for keyword-heavy questions about a
//! single document and for deterministic tests.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Default dimensionality, matching common small sentence-embedding models.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// A deterministic, offline [`EmbeddingProvider`].
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` entries.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }
        Ok(Self { dimensions })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: DEFAULT_DIMENSIONS }
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn embeddings_are_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let a = embedder.embed("The quick brown fox").await.unwrap();
        let b = embedder.embed("the QUICK brown fox!").await.unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("refund policy").await.unwrap();
        let related = embedder.embed("Our refund policy allows returns").await.unwrap();
        let unrelated = embedder.embed("Shipping takes five days").await.unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn empty_text_and_empty_batch() {
        let embedder = HashingEmbedder::new(8).unwrap();
        assert!(embedder.embed("").await.unwrap().iter().all(|x| *x == 0.0));
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }
}

//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. A provider must be deterministic for the lifetime of one
/// instance: the same text always yields the same vector, and every vector
/// has [`dimensions`](EmbeddingProvider::dimensions) entries. The same
/// instance embeds both the document chunks and later queries.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    ///
    /// An empty batch yields an empty result, not an error.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Check that a batch response has one vector per input, each of the
/// provider's dimensionality.
pub(crate) fn check_batch(
    provider: &dyn EmbeddingProvider,
    expected_len: usize,
    vectors: &[Vec<f32>],
) -> Result<()> {
    if vectors.len() != expected_len {
        return Err(RagError::embedding(
            provider.name(),
            format!("expected {expected_len} embeddings, got {}", vectors.len()),
        ));
    }
    let dimensions = provider.dimensions();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: bad.len() });
    }
    Ok(())
}

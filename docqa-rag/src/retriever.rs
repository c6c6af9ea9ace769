//! Document indexing and chunk retrieval.
//!
//! The [`Retriever`] composes a chunking strategy, an [`EmbeddingProvider`],
//! and a [`VectorIndex`]. Indexing runs chunk → embed → build and returns
//! the finished index as an `Arc` snapshot; retrieval embeds the question
//! with the same provider and returns the best-scoring chunks. The retriever
//! keeps no index of its own: the caller owns the snapshot (a
//! [`Session`](crate::Session) holds the one its questions are answered from).
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{Retriever, HashingEmbedder, ChunkingStrategy};
//!
//! let retriever = Retriever::builder()
//!     .embedding_provider(Arc::new(HashingEmbedder::default()))
//!     .chunking(ChunkingStrategy::Fixed)
//!     .build()?;
//!
//! let index = retriever.index_document(&document, 500, 50).await?;
//! let chunks = retriever.retrieve("what is the refund policy?", &index, 3).await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chunking::ChunkingStrategy;
use crate::document::{Chunk, Document, IndexEntry, SearchResult};
use crate::embedding::{EmbeddingProvider, check_batch};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Builds the index for a document and fetches relevant chunks for a query.
///
/// Every [`index_document`](Self::index_document) call produces a new,
/// complete index; an index is never modified after it is returned, so
/// readers holding a snapshot never observe a partial build. Construct one
/// via [`Retriever::builder()`] or [`Retriever::new`].
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingStrategy,
}

impl Retriever {
    /// Create a retriever with fixed-size chunking.
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedding_provider, chunking: ChunkingStrategy::default() }
    }

    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return the chunking strategy used by [`index_document`](Self::index_document).
    pub fn chunking(&self) -> ChunkingStrategy {
        self.chunking
    }

    /// Index a document: chunk → embed → build.
    ///
    /// On failure nothing is returned, so whatever index the caller already
    /// holds stays in use.
    ///
    /// # Errors
    ///
    /// - [`RagError::Config`] for invalid chunking parameters
    /// - [`RagError::Embedding`] if the embedding provider fails
    /// - [`RagError::DimensionMismatch`] if the provider returns vectors of
    ///   the wrong length
    pub async fn index_document(
        &self,
        document: &Document,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Arc<VectorIndex>> {
        let chunker = self.chunking.chunker(chunk_size, chunk_overlap)?;

        // 1. Chunk the document
        let chunks = chunker.chunk(document);
        debug!(document.id = %document.id, chunk_count = chunks.len(), "document chunked");

        // 2. Embed every chunk in one batch
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let provider = self.embedding_provider.as_ref();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            let embeddings = provider.embed_batch(&texts).await.map_err(|e| {
                error!(document.id = %document.id, error = %e, "embedding failed during indexing");
                e
            })?;
            check_batch(provider, texts.len(), &embeddings)?;
            embeddings
        };

        // 3. Build the index
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        let index = Arc::new(VectorIndex::with_dimensions(provider.dimensions(), entries)?);

        info!(
            document.id = %document.id,
            chunk_count = index.len(),
            dimensions = index.dimensions(),
            "indexed document"
        );
        Ok(index)
    }

    /// Return the `k` chunks of `index` most relevant to `query`, best first.
    ///
    /// An empty index yields an empty result without calling the embedding
    /// provider; callers treat that as "no context available".
    ///
    /// # Errors
    ///
    /// - [`RagError::Embedding`] if the query cannot be embedded
    /// - [`RagError::DimensionMismatch`] if `index` was built by a different
    ///   embedding provider
    pub async fn retrieve(&self, query: &str, index: &VectorIndex, k: usize) -> Result<Vec<Chunk>> {
        let results = self.retrieve_scored(query, index, k).await?;
        Ok(results.into_iter().map(|r| r.chunk).collect())
    }

    /// Like [`retrieve`](Self::retrieve), keeping the similarity scores.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        index: &VectorIndex,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if index.is_empty() || k == 0 {
            debug!("retrieval skipped: empty index");
            return Ok(Vec::new());
        }

        let provider = self.embedding_provider.as_ref();
        let query_embedding = provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            e
        })?;
        if query_embedding.len() != provider.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: provider.dimensions(),
                actual: query_embedding.len(),
            });
        }

        let results = index.query(&query_embedding, k)?;
        debug!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}

/// Builder for constructing a [`Retriever`].
///
/// The embedding provider is required; chunking defaults to
/// [`ChunkingStrategy::Fixed`].
#[derive(Default)]
pub struct RetrieverBuilder {
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunking: ChunkingStrategy,
}

impl RetrieverBuilder {
    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the chunking strategy.
    pub fn chunking(mut self, chunking: ChunkingStrategy) -> Self {
        self.chunking = chunking;
        self
    }

    /// Build the [`Retriever`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if no embedding provider was set.
    pub fn build(self) -> Result<Retriever> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let mut retriever = Retriever::new(embedding_provider);
        retriever.chunking = self.chunking;
        Ok(retriever)
    }
}

//! Configuration for indexing and answering.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::ChunkingStrategy;
use crate::error::{RagError, Result};

/// Configuration parameters for the question-answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// How document text is cut into chunks.
    pub chunking: ChunkingStrategy,
    /// Number of chunks retrieved as context for each question.
    pub top_k: usize,
    /// Minimum similarity score for retrieved chunks. `None` keeps every
    /// retrieved chunk.
    pub similarity_threshold: Option<f32>,
    /// Maximum number of sentences in an answer.
    pub max_sentences: usize,
    /// Number of most recent turns included in each prompt.
    pub history_window: usize,
    /// Upper bound on a single generation backend call.
    pub generation_timeout: Duration,
    /// Rewrite follow-up questions into standalone questions before retrieval.
    pub contextualize_questions: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            chunking: ChunkingStrategy::Fixed,
            top_k: 3,
            similarity_threshold: None,
            max_sentences: 3,
            history_window: 6,
            generation_timeout: Duration::from_secs(60),
            contextualize_questions: false,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `max_sentences == 0`
    /// - `generation_timeout` is zero
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.max_sentences == 0 {
            return Err(RagError::Config("max_sentences must be greater than zero".to_string()));
        }
        if self.generation_timeout.is_zero() {
            return Err(RagError::Config("generation_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Reject chunking parameters outside `0 <= overlap < chunk_size`.
pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Config(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for retrieved chunks.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the answer sentence cap.
    pub fn max_sentences(mut self, max: usize) -> Self {
        self.config.max_sentences = max;
        self
    }

    /// Set how many recent turns are replayed in each prompt.
    pub fn history_window(mut self, turns: usize) -> Self {
        self.config.history_window = turns;
        self
    }

    /// Set the per-call generation timeout.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = timeout;
        self
    }

    /// Enable or disable follow-up question rewriting.
    pub fn contextualize_questions(mut self, enabled: bool) -> Self {
        self.config.contextualize_questions = enabled;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! Embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! This module is only available when the `openai` feature is enabled. It
//! works with the OpenAI API itself and with self-hosted servers exposing
//! the same route, such as Hugging Face text-embeddings-inference or Ollama.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{EmbeddingProvider, check_batch};
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Configuration
///
/// - `base_url` – defaults to [`OPENAI_API_BASE`].
/// - `model` – defaults to `text-embedding-3-small`.
/// - `dimensions` – must match what the model returns; every response is checked.
/// - `api_key` – optional, sent as a bearer token when present.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAiCompatibleEmbedder;
///
/// let provider = OpenAiCompatibleEmbedder::new("http://localhost:8080/v1")
///     .with_model("sentence-transformers/all-MiniLM-L6-v2", 384);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAiCompatibleEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl OpenAiCompatibleEmbedder {
    /// Create a provider for the endpoint at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Create a provider for the OpenAI API using the `OPENAI_API_KEY`
    /// environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::embedding("OpenAI", "OPENAI_API_KEY environment variable not set")
        })?;
        Ok(Self::new(OPENAI_API_BASE).with_api_key(api_key))
    }

    /// Send `api_key` as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the model name and the dimensionality it produces.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = %self.model, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(&self.model, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = %self.model, batch_size = texts.len(), "embedding batch");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };
        let mut request =
            self.client.post(format!("{}/embeddings", self.base_url)).json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = %self.model, error = %e, "request failed");
            RagError::embedding(&self.model, format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = %self.model, %status, "API error");
            return Err(RagError::embedding(
                &self.model,
                format!("API returned {status}: {detail}"),
            ));
        }

        let mut embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = %self.model, error = %e, "failed to parse response");
            RagError::embedding(&self.model, format!("failed to parse response: {e}"))
        })?;

        embedding_response.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> =
            embedding_response.data.into_iter().map(|d| d.embedding).collect();
        check_batch(self, texts.len(), &vectors)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

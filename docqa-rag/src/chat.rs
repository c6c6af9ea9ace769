//! Generation backend for OpenAI-compatible `/chat/completions` endpoints.
//!
//! This module is only available when the `openai` feature is enabled.
//! Groq, OpenAI, DeepSeek, Ollama and vLLM all speak this protocol; the
//! default configuration targets Groq.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{GenerationErrorKind, RagError, Result};
use crate::generation::GenerationBackend;
use crate::prompt::{Message, Prompt};

/// The Groq OpenAI-compatible API base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The default Groq chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// A [`GenerationBackend`] calling an OpenAI-compatible chat completions API.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::chat::ChatCompletionsBackend;
///
/// let backend = ChatCompletionsBackend::groq(std::env::var("GROQ_API_KEY")?)?
///     .with_temperature(0.0);
/// ```
pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatCompletionsBackend {
    /// Create a backend for `model` at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `api_key` is empty.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Config("API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        })
    }

    /// Create a backend for Groq's default model.
    pub fn groq(api_key: impl Into<String>) -> Result<Self> {
        Self::new(GROQ_API_BASE, api_key, DEFAULT_GROQ_MODEL)
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Limit the completion length in tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn fail(&self, kind: GenerationErrorKind, message: impl Into<String>) -> RagError {
        RagError::generation(&self.model, kind, message)
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn classify_status(status: StatusCode) -> GenerationErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationErrorKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GenerationErrorKind::Timeout,
        _ => GenerationErrorKind::Backend,
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let messages = prompt.messages();
        debug!(model = %self.model, message_count = messages.len(), "chat completion request");

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "request failed");
                let kind = if e.is_timeout() {
                    GenerationErrorKind::Timeout
                } else {
                    GenerationErrorKind::Network
                };
                self.fail(kind, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(model = %self.model, %status, "API error");
            return Err(
                self.fail(classify_status(status), format!("API returned {status}: {detail}"))
            );
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse response");
            self.fail(GenerationErrorKind::Backend, format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.fail(GenerationErrorKind::Backend, "response has no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            GenerationErrorKind::RateLimited
        );
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT), GenerationErrorKind::Timeout);
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), GenerationErrorKind::Backend);
    }

    #[test]
    fn rejects_empty_api_key() {
        assert!(ChatCompletionsBackend::groq("").is_err());
        assert_eq!(ChatCompletionsBackend::groq("key").unwrap().name(), DEFAULT_GROQ_MODEL);
    }

    #[test]
    fn request_serializes_messages_with_roles() {
        let prompt = crate::prompt::answer_prompt("why?", &[], &[], 3);
        let body = ChatRequest {
            model: "m",
            messages: prompt.messages(),
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "why?");
        assert!(json.get("temperature").is_none());
    }
}

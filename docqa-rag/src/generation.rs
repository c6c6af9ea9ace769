//! Generation backend trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::prompt::Prompt;

/// A language model that turns a [`Prompt`] into text.
///
/// Implementations report failures as
/// [`RagError::Generation`](crate::RagError::Generation) with the matching
/// [`GenerationErrorKind`](crate::GenerationErrorKind). Timeouts are applied
/// by the caller, so implementations need not enforce one themselves.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::GenerationBackend;
///
/// let backend = ChatCompletionsBackend::groq(api_key)?;
/// let text = backend.generate(&prompt).await?;
/// ```
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

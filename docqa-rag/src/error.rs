//! Error types for the `docqa-rag` crate.

use std::fmt;

use thiserror::Error;

/// Why a call to a generation backend failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// The backend did not answer within the configured timeout.
    Timeout,
    /// The backend refused the request because of rate limiting.
    RateLimited,
    /// The request never reached the backend or the connection dropped.
    Network,
    /// The backend answered with an error status or an unusable payload.
    Backend,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate limited",
            Self::Network => "network",
            Self::Backend => "backend",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while indexing a document or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// The uploaded file could not be turned into document text.
    #[error("Ingestion error: {message}")]
    Ingestion {
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Vectors of different lengths were mixed in one index.
    #[error("Dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the index was built with.
        expected: usize,
        /// The dimensionality that was offered.
        actual: usize,
    },

    /// The generation backend failed to produce an answer.
    #[error("Generation error ({backend}, {kind}): {message}")]
    Generation {
        /// The generation backend that produced the error.
        backend: String,
        /// The failure category.
        kind: GenerationErrorKind,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The question cannot be answered as given.
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),
}

impl RagError {
    pub(crate) fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion { message: message.into() }
    }

    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Embedding { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn generation(
        backend: impl Into<String>,
        kind: GenerationErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Generation { backend: backend.into(), kind, message: message.into() }
    }

    /// Whether the caller may reasonably retry the failed operation.
    ///
    /// Only generation failures are transient; everything else needs a
    /// different input or different wiring.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// The generation failure category, if this is a generation error.
    pub fn generation_kind(&self) -> Option<GenerationErrorKind> {
        match self {
            Self::Generation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_are_retryable() {
        let err = RagError::generation("groq", GenerationErrorKind::RateLimited, "429");
        assert!(err.is_retryable());
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::RateLimited));
        assert_eq!(err.to_string(), "Generation error (groq, rate limited): 429");
    }

    #[test]
    fn other_errors_are_not_retryable() {
        assert!(!RagError::DimensionMismatch { expected: 3, actual: 4 }.is_retryable());
        assert!(!RagError::ingestion("corrupt file").is_retryable());
        assert!(RagError::embedding("hashing", "down").generation_kind().is_none());
    }
}

//! Grounded, length-capped answering with conversation history.
//!
//! [`ConversationEngine::answer`] runs one turn:
//!
//! 1. optionally rewrite a follow-up into a standalone question
//! 2. retrieve the top-k chunks from the session's index
//! 3. assemble the prompt from instruction, context, recent turns, and question
//! 4. call the generation backend under a timeout
//! 5. cut the reply at the sentence cap
//! 6. return the answer with a new session holding the appended turn
//!
//! Any failure returns before step 6, so the caller's session is unchanged.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::RagConfig;
use crate::document::Chunk;
use crate::error::{GenerationErrorKind, RagError, Result};
use crate::generation::GenerationBackend;
use crate::prompt::{OUT_OF_CONTEXT, Prompt, answer_prompt, condense_prompt};
use crate::retriever::Retriever;
use crate::sentences::truncate_sentences;
use crate::session::Session;

/// Reply given when no document has been processed yet.
pub const NO_DOCUMENT_ANSWER: &str = "Please upload and process a document first.";

/// The result of one answered question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The answer text after the sentence cap was applied.
    pub text: String,
    /// Whether any document context backed the answer.
    ///
    /// `false` means the index was empty or nothing relevant was retrieved;
    /// the text must not be presented as coming from the document.
    pub grounded: bool,
    /// The chunks supplied as context, best first.
    pub sources: Vec<Chunk>,
    /// Whether the backend over-generated and sentences were dropped.
    pub truncated: bool,
    /// The rewritten question used for retrieval, when rewriting ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standalone_question: Option<String>,
}

impl Answer {
    /// Whether the backend declared the question unrelated to the document.
    pub fn out_of_context(&self) -> bool {
        let text = self.text.trim().trim_end_matches(['.', '!']).trim_matches(['\'', '"']);
        text.eq_ignore_ascii_case(OUT_OF_CONTEXT)
    }
}

/// Produces answers and derives the next [`Session`].
pub struct ConversationEngine {
    backend: Arc<dyn GenerationBackend>,
    history_window: usize,
    generation_timeout: Duration,
    similarity_threshold: Option<f32>,
    contextualize_questions: bool,
}

impl ConversationEngine {
    /// Create an engine with the default [`RagConfig`] settings.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self::from_config(backend, &RagConfig::default())
    }

    /// Create an engine taking history, timeout, threshold, and rewriting
    /// settings from `config`.
    pub fn from_config(backend: Arc<dyn GenerationBackend>, config: &RagConfig) -> Self {
        Self {
            backend,
            history_window: config.history_window,
            generation_timeout: config.generation_timeout,
            similarity_threshold: config.similarity_threshold,
            contextualize_questions: config.contextualize_questions,
        }
    }

    /// Set how many recent turns are replayed in each prompt.
    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    /// Set the per-call generation timeout.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Drop retrieved chunks scoring below `threshold`.
    ///
    /// Without a threshold every retrieved chunk is used as context,
    /// whatever its score.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    /// Enable or disable follow-up question rewriting.
    pub fn with_contextualize_questions(mut self, enabled: bool) -> Self {
        self.contextualize_questions = enabled;
        self
    }

    /// Return a reference to the generation backend.
    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    /// Answer `question` about the session's document.
    ///
    /// Returns the answer and a new session with the turn appended. When the
    /// session has no indexed document the backend is not called and the
    /// answer is [`NO_DOCUMENT_ANSWER`], flagged as ungrounded.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidQuestion`] for an empty question
    /// - [`RagError::Config`] if `max_sentences` is zero
    /// - [`RagError::Embedding`] / [`RagError::DimensionMismatch`] from retrieval
    /// - [`RagError::Generation`] if the backend fails or times out
    ///
    /// In every error case `session` is left as it was.
    pub async fn answer(
        &self,
        question: &str,
        session: &Session,
        retriever: &Retriever,
        k: usize,
        max_sentences: usize,
    ) -> Result<(Answer, Session)> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidQuestion("question must not be empty".to_string()));
        }
        if max_sentences == 0 {
            return Err(RagError::Config("max_sentences must be greater than zero".to_string()));
        }

        let index = session.index().clone();
        if index.is_empty() {
            warn!(session.id = session.id(), "question asked with no document indexed");
            let answer = Answer {
                text: NO_DOCUMENT_ANSWER.to_string(),
                grounded: false,
                sources: Vec::new(),
                truncated: false,
                standalone_question: None,
            };
            let next = session.with_turn(question, answer.text.clone(), false);
            return Ok((answer, next));
        }

        let history = session.recent_turns(self.history_window);

        // 1. Rewrite follow-ups
        let standalone_question = if self.contextualize_questions && !history.is_empty() {
            let rewritten = self.generate(&condense_prompt(question, history)).await?;
            let rewritten = rewritten.trim();
            debug!(original = question, rewritten, "question rewritten for retrieval");
            (!rewritten.is_empty()).then(|| rewritten.to_string())
        } else {
            None
        };
        let search_query = standalone_question.as_deref().unwrap_or(question);

        // 2. Retrieve
        let threshold = self.similarity_threshold;
        let sources: Vec<Chunk> = retriever
            .retrieve_scored(search_query, &index, k)
            .await?
            .into_iter()
            .filter(|r| threshold.is_none_or(|min| r.score >= min))
            .map(|r| r.chunk)
            .collect();
        let grounded = !sources.is_empty();
        if !grounded {
            warn!(session.id = session.id(), "no grounding context retrieved");
        }

        // 3. Assemble and generate
        let prompt = answer_prompt(question, &sources, history, max_sentences);
        let raw = self.generate(&prompt).await?;

        // 4. Enforce the sentence cap
        let (text, truncated) = truncate_sentences(&raw, max_sentences);
        if text.is_empty() {
            error!(backend = self.backend.name(), "backend returned an empty completion");
            return Err(RagError::generation(
                self.backend.name(),
                GenerationErrorKind::Backend,
                "empty completion",
            ));
        }

        // 5. Append the turn
        let next = session.with_turn(question, text.clone(), grounded);
        info!(
            session.id = next.id(),
            turn_count = next.turns().len(),
            source_count = sources.len(),
            grounded,
            truncated,
            "question answered"
        );

        Ok((Answer { text, grounded, sources, truncated, standalone_question }, next))
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let backend = self.backend.name();
        match tokio::time::timeout(self.generation_timeout, self.backend.generate(prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                error!(backend, error = %e, "generation failed");
                Err(e)
            }
            Err(_) => {
                error!(backend, timeout = ?self.generation_timeout, "generation timed out");
                Err(RagError::generation(
                    backend,
                    GenerationErrorKind::Timeout,
                    format!("no response within {:?}", self.generation_timeout),
                ))
            }
        }
    }
}

//! Session host tying the retriever, the engine, and the live session together.
//!
//! [`DocumentQa`] is what a UI holds for the lifetime of the application:
//! one document at a time, one conversation about it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::config::RagConfig;
use crate::document::Document;
use crate::engine::{Answer, ConversationEngine};
use crate::error::Result;
use crate::generation::GenerationBackend;
use crate::retriever::Retriever;
use crate::session::Session;

/// What [`DocumentQa::process`] did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessSummary {
    /// The processed document.
    pub document_id: String,
    /// Number of chunks in the index.
    pub chunk_count: usize,
    /// `true` if the same document was already indexed and nothing was rebuilt.
    pub reused: bool,
}

/// Single-document question answering with conversation history.
///
/// Processing a document builds a new index and starts a new session that
/// holds it; the session's index is the only published one. Document
/// processing is serialized, so a second upload waits for the build in
/// flight. Questions are answered one at a time against the session current
/// when the question arrived; if a new document replaced that session in the
/// meantime, the answer is still returned but its turn is not recorded.
pub struct DocumentQa {
    config: RagConfig,
    retriever: Retriever,
    engine: ConversationEngine,
    session: RwLock<Session>,
    process_lock: Mutex<()>,
    ask_lock: Mutex<()>,
}

impl DocumentQa {
    /// Create a host from a validated config and the two backends.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) if `config` is invalid.
    pub fn new(
        config: RagConfig,
        retriever: Retriever,
        backend: Arc<dyn GenerationBackend>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = ConversationEngine::from_config(backend, &config);
        Ok(Self {
            config,
            retriever,
            engine,
            session: RwLock::new(Session::new()),
            process_lock: Mutex::new(()),
            ask_lock: Mutex::new(()),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// A copy of the current session.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Index `document` and start a new session about it.
    ///
    /// Uploading the document that is already indexed keeps the index and
    /// the conversation. On failure the previous index and session stay in
    /// place.
    pub async fn process(&self, document: &Document) -> Result<ProcessSummary> {
        let _guard = self.process_lock.lock().await;
        {
            let session = self.session.read().await;
            if session.document().is_some_and(|d| d.id == document.id) {
                info!(document.id = %document.id, "document already indexed");
                return Ok(ProcessSummary {
                    document_id: document.id.clone(),
                    chunk_count: session.index().len(),
                    reused: true,
                });
            }
        }

        let index = self
            .retriever
            .index_document(document, self.config.chunk_size, self.config.chunk_overlap)
            .await?;
        let chunk_count = index.len();
        *self.session.write().await = Session::for_document(document, index);

        Ok(ProcessSummary { document_id: document.id.clone(), chunk_count, reused: false })
    }

    /// Answer `question` and record the turn.
    ///
    /// # Errors
    ///
    /// Propagates [`ConversationEngine::answer`] errors; the session is
    /// unchanged when an error is returned.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let _guard = self.ask_lock.lock().await;
        let session = self.session().await;

        let (answer, next) = self
            .engine
            .answer(
                question,
                &session,
                &self.retriever,
                self.config.top_k,
                self.config.max_sentences,
            )
            .await?;

        let mut current = self.session.write().await;
        if current.id() == session.id() && current.version() == session.version() {
            *current = next;
        } else {
            info!("session replaced while answering; turn not recorded");
        }
        Ok(answer)
    }

    /// Drop the conversation history, keeping the document.
    pub async fn clear_history(&self) {
        let _guard = self.ask_lock.lock().await;
        let mut session = self.session.write().await;
        *session = session.cleared();
    }

    /// Forget the document and the conversation.
    pub async fn reset(&self) {
        let _process = self.process_lock.lock().await;
        let _ask = self.ask_lock.lock().await;
        *self.session.write().await = Session::new();
    }
}

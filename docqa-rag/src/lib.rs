//! # docqa-rag
//!
//! Retrieval-Augmented Generation over a single uploaded document.
//!
//! ## Overview
//!
//! A document flows through the pipeline once when it is processed:
//!
//! ```text
//! Document → Chunker → EmbeddingProvider → VectorIndex
//! ```
//!
//! and every question flows through it afterwards:
//!
//! ```text
//! Question + Session → Retriever → chunks → ConversationEngine → Answer + Session'
//! ```
//!
//! - [`chunking`]: fixed-size and recursive splitters with character offsets
//! - [`EmbeddingProvider`]: the embedding capability; [`HashingEmbedder`]
//!   runs offline, [`openai::OpenAiCompatibleEmbedder`] calls a remote model
//! - [`VectorIndex`]: cosine top-k over the chunks of one document
//! - [`Retriever`]: builds an immutable index snapshot, fetches chunks for a query
//! - [`ConversationEngine`]: prompt assembly, generation under a timeout,
//!   sentence cap, history update
//! - [`DocumentQa`]: the session host a UI keeps for the application lifetime
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{DocumentQa, Document, HashingEmbedder, RagConfig, Retriever};
//! use docqa_rag::chat::ChatCompletionsBackend;
//!
//! let retriever = Retriever::new(Arc::new(HashingEmbedder::default()));
//! let backend = Arc::new(ChatCompletionsBackend::groq(std::env::var("GROQ_API_KEY")?)?);
//! let qa = DocumentQa::new(RagConfig::default(), retriever, backend)?;
//!
//! qa.process(&Document::from_upload("notes.txt", &bytes, text)).await?;
//! let answer = qa.ask("What is the refund window?").await?;
//! if !answer.grounded {
//!     println!("(no document context)");
//! }
//! println!("{}", answer.text);
//! ```
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAiCompatibleEmbedder`] and [`chat::ChatCompletionsBackend`]
//! - `pdf`: [`extract::PdfTextExtractor`]

#[cfg(feature = "openai")]
pub mod chat;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod extract;
pub mod generation;
pub mod hashing;
pub mod index;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;
pub mod qa;
pub mod retriever;
pub mod sentences;
pub mod session;

pub use chunking::{Chunker, ChunkingStrategy, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, IndexEntry, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{Answer, ConversationEngine, NO_DOCUMENT_ANSWER};
pub use error::{GenerationErrorKind, RagError, Result};
pub use extract::{MAX_UPLOAD_BYTES, PlainTextExtractor, TextExtractor};
pub use generation::GenerationBackend;
pub use hashing::HashingEmbedder;
pub use index::VectorIndex;
pub use prompt::{Message, Prompt, Role};
pub use qa::{DocumentQa, ProcessSummary};
pub use retriever::{Retriever, RetrieverBuilder};
pub use session::{DocumentHandle, Session, Turn};

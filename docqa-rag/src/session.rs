//! Conversation history for one document.
//!
//! A [`Session`] is a value: operations that change it return a new
//! `Session` with a higher [`version`](Session::version) and leave the
//! original untouched. A failed answer therefore never has to roll back
//! anything; the caller simply keeps the session it already had.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;
use crate::index::VectorIndex;

/// One question and its answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Position in the session, starting at 1.
    pub seq: u64,
    /// The question as the user asked it.
    pub question: String,
    /// The post-processed answer.
    pub answer: String,
    /// Whether document context was available for the answer.
    pub grounded: bool,
    /// When the turn was appended.
    pub created_at: DateTime<Utc>,
}

/// The uploaded document a session talks about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentHandle {
    /// The document identifier.
    pub id: String,
    /// The document display name.
    pub name: String,
}

/// Ordered turns plus the index they were answered against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: String,
    document: Option<DocumentHandle>,
    turns: Vec<Turn>,
    version: u64,
    #[serde(skip)]
    index: Arc<VectorIndex>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a session with no document and no history.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document: None,
            turns: Vec::new(),
            version: 0,
            index: Arc::new(VectorIndex::new()),
        }
    }

    /// Start a fresh session about `document`, answered from `index`.
    pub fn for_document(document: &Document, index: Arc<VectorIndex>) -> Self {
        Self {
            document: Some(DocumentHandle { id: document.id.clone(), name: document.name.clone() }),
            index,
            ..Self::new()
        }
    }

    /// Unique identifier of this session lineage.
    ///
    /// Values derived with [`with_turn`](Self::with_turn) or
    /// [`cleared`](Self::cleared) keep the identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Incremented on every derived value.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The document this session is about, if one was processed.
    pub fn document(&self) -> Option<&DocumentHandle> {
        self.document.as_ref()
    }

    /// The index questions are answered from.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// A copy of this session with one more turn appended.
    pub fn with_turn(
        &self,
        question: impl Into<String>,
        answer: impl Into<String>,
        grounded: bool,
    ) -> Self {
        let mut next = self.clone();
        next.turns.push(Turn {
            seq: self.turns.last().map_or(1, |t| t.seq + 1),
            question: question.into(),
            answer: answer.into(),
            grounded,
            created_at: Utc::now(),
        });
        next.version += 1;
        next
    }

    /// A copy of this session with the history removed and the document kept.
    pub fn cleared(&self) -> Self {
        let mut next = self.clone();
        next.turns.clear();
        next.version += 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_turn_leaves_original_untouched() {
        let session = Session::new();
        let next = session.with_turn("q1", "a1", true);

        assert!(session.turns().is_empty());
        assert_eq!(session.version(), 0);
        assert_eq!(next.turns().len(), 1);
        assert_eq!(next.version(), 1);
        assert_eq!(next.id(), session.id());
        assert_eq!(next.turns()[0].seq, 1);
    }

    #[test]
    fn turns_keep_order_and_sequence() {
        let session = Session::new().with_turn("q1", "a1", true).with_turn("q2", "a2", false);
        let questions: Vec<&str> = session.turns().iter().map(|t| t.question.as_str()).collect();

        assert_eq!(questions, vec!["q1", "q2"]);
        assert_eq!(session.turns()[1].seq, 2);
        assert!(!session.turns()[1].grounded);
    }

    #[test]
    fn recent_turns_windows_history() {
        let mut session = Session::new();
        for i in 0..5 {
            session = session.with_turn(format!("q{i}"), format!("a{i}"), true);
        }
        let recent: Vec<&str> =
            session.recent_turns(2).iter().map(|t| t.question.as_str()).collect();

        assert_eq!(recent, vec!["q3", "q4"]);
        assert_eq!(session.recent_turns(10).len(), 5);
        assert!(session.recent_turns(0).is_empty());
    }

    #[test]
    fn cleared_keeps_document() {
        let document = Document::new("doc", "text");
        let session = Session::for_document(&document, Arc::new(VectorIndex::new()))
            .with_turn("q", "a", true);
        let cleared = session.cleared();

        assert!(cleared.turns().is_empty());
        assert_eq!(cleared.document().map(|d| d.id.as_str()), Some("doc"));
        assert_eq!(cleared.version(), 2);
    }

    #[test]
    fn new_document_starts_new_lineage() {
        let document = Document::new("doc", "text");
        let first = Session::new();
        let second = Session::for_document(&document, Arc::new(VectorIndex::new()));
        assert_ne!(first.id(), second.id());
    }
}

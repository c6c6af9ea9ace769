//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The text of one uploaded file.
///
/// A document is immutable once created. Its `id` is the session-scoped
/// handle used to detect re-uploads of the same file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// Display name, usually the uploaded file name.
    pub name: String,
    /// The extracted text content of the document.
    pub text: String,
    /// Key-value metadata copied onto every chunk.
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with an explicit identifier.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            text: text.into(),
            metadata: HashMap::new(),
            source_uri: None,
        }
    }

    /// Create a document for an uploaded file.
    ///
    /// The identifier is the hex SHA-256 of the raw upload, so uploading the
    /// same bytes twice yields the same handle.
    pub fn from_upload(name: impl Into<String>, bytes: &[u8], text: impl Into<String>) -> Self {
        let name = name.into();
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), name.clone());
        Self { id: content_hash(bytes), name, text: text.into(), metadata, source_uri: None }
    }

    /// Attach a source URI.
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Hex SHA-256 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// A contiguous segment of a [`Document`].
///
/// `start` and `end` are character offsets into the document text, `end`
/// exclusive. `index` is the position of the chunk in split order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}_{index}`.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Sequence number within the document.
    pub index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset where the chunk starts.
    pub start: usize,
    /// Character offset one past the last character of the chunk.
    pub end: usize,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A [`Chunk`] paired with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The vector embedding for the chunk's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_id_is_stable_content_hash() {
        let a = Document::from_upload("a.txt", b"same bytes", "same bytes");
        let b = Document::from_upload("b.txt", b"same bytes", "same bytes");
        let c = Document::from_upload("a.txt", b"other bytes", "other bytes");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 64);
        assert_eq!(a.metadata.get("source").map(String::as_str), Some("a.txt"));
    }

    #[test]
    fn char_len_counts_characters_not_bytes() {
        let doc = Document::new("doc", "héllo");
        assert_eq!(doc.char_len(), 5);
        assert_eq!(doc.name, "doc");
    }
}

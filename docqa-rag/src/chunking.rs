//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: fixed character windows advancing by `chunk_size - overlap`
//! - [`RecursiveChunker`]: splits on paragraphs, lines, sentences, then words,
//!   and packs the pieces into windows with trailing overlap
//!
//! Both work in character offsets, never byte offsets, so multi-byte text
//! never gets cut inside a code point. Chunks from either strategy are
//! contiguous, ordered, and overlap only with their predecessor, so the
//! document text is recovered by dropping each chunk's overlap with the
//! previous one and concatenating.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::validate_chunking;
use crate::document::{Chunk, Document};
use crate::error::Result;

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Selects a [`Chunker`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// [`FixedSizeChunker`].
    #[default]
    Fixed,
    /// [`RecursiveChunker`].
    Recursive,
}

impl ChunkingStrategy {
    /// Build the chunker for this strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) unless
    /// `0 <= chunk_overlap < chunk_size`.
    pub fn chunker(self, chunk_size: usize, chunk_overlap: usize) -> Result<Box<dyn Chunker>> {
        Ok(match self {
            Self::Fixed => Box::new(FixedSizeChunker::new(chunk_size, chunk_overlap)?),
            Self::Recursive => Box::new(RecursiveChunker::new(chunk_size, chunk_overlap)?),
        })
    }
}

/// Split raw text into fixed-size overlapping chunks.
///
/// The returned chunks carry an empty `document_id`; use a [`Chunker`] to
/// split a [`Document`].
///
/// ```rust
/// let chunks = docqa_rag::chunking::split(&"a".repeat(1200), 500, 50).unwrap();
/// let ranges: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
/// assert_eq!(ranges, vec![(0, 500), (450, 950), (900, 1200)]);
/// ```
///
/// # Errors
///
/// Returns [`RagError::Config`](crate::RagError::Config) unless
/// `0 <= overlap < chunk_size`.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    validate_chunking(chunk_size, overlap)?;
    let offsets = CharOffsets::new(text);
    let windows = fixed_windows(offsets.char_len(), chunk_size, overlap);
    Ok(assemble("", text, &HashMap::new(), &offsets, &windows))
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Each window starts `chunk_size - chunk_overlap` characters after the
/// previous one. The last window may be shorter. Chunk IDs are generated as
/// `{document_id}_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(500, 50)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) unless
    /// `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }
        let offsets = CharOffsets::new(&document.text);
        let windows = fixed_windows(offsets.char_len(), self.chunk_size, self.chunk_overlap);
        assemble(&document.id, &document.text, &document.metadata, &offsets, &windows)
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Text is first cut at the coarsest separator present; any piece still
/// longer than `chunk_size` is cut at the next separator. Separators stay
/// attached to the preceding piece. Pieces are then packed greedily into
/// windows of at most `chunk_size` characters, and each new window starts
/// with the trailing pieces of the previous one that fit in `chunk_overlap`.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) unless
    /// `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let mut pieces = Vec::new();
        split_pieces(&chars, 0, chars.len(), self.chunk_size, SEPARATORS, &mut pieces);
        let windows = merge_pieces(&pieces, self.chunk_size, self.chunk_overlap);

        let offsets = CharOffsets::new(&document.text);
        assemble(&document.id, &document.text, &document.metadata, &offsets, &windows)
    }
}

/// Byte offset of every character boundary, plus the end of the text.
struct CharOffsets {
    bytes: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let bytes =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        Self { bytes }
    }

    fn char_len(&self) -> usize {
        self.bytes.len() - 1
    }

    fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        &text[self.bytes[start]..self.bytes[end]]
    }
}

fn fixed_windows(len: usize, chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, usize)> {
    let step = chunk_size - chunk_overlap;
    let mut windows = Vec::new();
    let mut start = 0;

    while start < len {
        let end = (start + chunk_size).min(len);
        windows.push((start, end));
        if end == len {
            break;
        }
        start += step;
    }

    windows
}

/// Cut `chars[start..end]` into contiguous pieces no longer than `chunk_size`.
fn split_pieces(
    chars: &[char],
    start: usize,
    end: usize,
    chunk_size: usize,
    separators: &[&str],
    out: &mut Vec<(usize, usize)>,
) {
    if end - start <= chunk_size {
        out.push((start, end));
        return;
    }

    let Some((separator, remaining)) = separators.split_first() else {
        let mut s = start;
        while s < end {
            let e = (s + chunk_size).min(end);
            out.push((s, e));
            s = e;
        }
        return;
    };

    let separator: Vec<char> = separator.chars().collect();
    let mut cuts = Vec::new();
    let mut i = start;
    while i + separator.len() <= end {
        if chars[i..i + separator.len()] == separator[..] {
            i += separator.len();
            cuts.push(i);
        } else {
            i += 1;
        }
    }

    if cuts.is_empty() {
        split_pieces(chars, start, end, chunk_size, remaining, out);
        return;
    }

    let mut piece_start = start;
    for cut in cuts.into_iter().chain(std::iter::once(end)) {
        if cut > piece_start {
            split_pieces(chars, piece_start, cut, chunk_size, remaining, out);
            piece_start = cut;
        }
    }
}

/// Pack contiguous pieces into windows, carrying trailing pieces as overlap.
fn merge_pieces(
    pieces: &[(usize, usize)],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    let mut current: std::collections::VecDeque<(usize, usize)> = Default::default();

    for &piece in pieces {
        let piece_len = piece.1 - piece.0;
        if let (Some(first), Some(last)) = (current.front(), current.back()) {
            if last.1 - first.0 + piece_len > chunk_size {
                let window_end = last.1;
                windows.push((first.0, window_end));
                while let Some(first) = current.front() {
                    let kept = window_end - first.0;
                    if kept > chunk_overlap || kept + piece_len > chunk_size {
                        current.pop_front();
                    } else {
                        break;
                    }
                }
            }
        }
        current.push_back(piece);
    }

    if let (Some(first), Some(last)) = (current.front(), current.back()) {
        windows.push((first.0, last.1));
    }

    windows
}

fn assemble(
    document_id: &str,
    text: &str,
    metadata: &HashMap<String, String>,
    offsets: &CharOffsets,
    windows: &[(usize, usize)],
) -> Vec<Chunk> {
    windows
        .iter()
        .enumerate()
        .map(|(index, &(start, end))| {
            let mut metadata = metadata.clone();
            metadata.insert("chunk_index".to_string(), index.to_string());
            Chunk {
                id: format!("{document_id}_{index}"),
                document_id: document_id.to_string(),
                index,
                text: offsets.slice(text, start, end).to_string(),
                start,
                end,
                metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(chunks: &[Chunk]) -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start, c.end)).collect()
    }

    #[test]
    fn fixed_windows_for_1200_chars() {
        let text: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = split(&text, 500, 50).unwrap();

        assert_eq!(ranges(&chunks), vec![(0, 500), (450, 950), (900, 1200)]);
        assert_eq!(chunks[2].char_len(), 300);
        assert_eq!(chunks[1].text, text[450..950]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split("", 10, 2).unwrap().is_empty());
        let chunker = RecursiveChunker::new(10, 2).unwrap();
        assert!(chunker.chunk(&Document::new("d", "")).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split("hello", 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello");
        assert_eq!(ranges(&chunks), vec![(0, 5)]);
    }

    #[test]
    fn exact_multiple_does_not_emit_redundant_tail() {
        let chunks = split(&"x".repeat(500), 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(split("abc", 0, 0).is_err());
        assert!(split("abc", 10, 10).is_err());
        assert!(FixedSizeChunker::new(5, 7).is_err());
        assert!(RecursiveChunker::new(5, 5).is_err());
    }

    #[test]
    fn multibyte_text_is_split_on_characters() {
        let text = "héllo wörld ünïcode";
        let chunks = split(text, 5, 1).unwrap();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 5);
        }
        assert_eq!(chunks[0].text, "héllo");
        assert_eq!(chunks[1].text, "o wör");
    }

    #[test]
    fn chunker_stamps_document_identity() {
        let mut doc = Document::new("doc1", "abcdefghij");
        doc.metadata.insert("source".into(), "file.txt".into());
        let chunks = FixedSizeChunker::new(4, 1).unwrap().chunk(&doc);

        assert_eq!(chunks[1].id, "doc1_1");
        assert_eq!(chunks[1].document_id, "doc1");
        assert_eq!(chunks[1].metadata.get("chunk_index").unwrap(), "1");
        assert_eq!(chunks[1].metadata.get("source").unwrap(), "file.txt");
    }

    #[test]
    fn recursive_prefers_paragraph_boundaries() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird one.";
        let doc = Document::new("d", text);
        let chunks = RecursiveChunker::new(30, 0).unwrap().chunk(&doc);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "First paragraph here.\n\n");
        assert_eq!(chunks[1].text, "Second paragraph here.\n\n");
        assert_eq!(chunks[2].text, "Third one.");
    }

    #[test]
    fn recursive_carries_trailing_words_as_overlap() {
        let text = "one two three four five six seven eight nine ten";
        let doc = Document::new("d", text);
        let chunks = RecursiveChunker::new(20, 8).unwrap().chunk(&doc);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert!(pair[1].start < pair[0].end, "expected overlap between chunks");
            assert!(pair[1].start > pair[0].start);
        }
        for chunk in &chunks {
            assert!(chunk.char_len() <= 20);
        }
        assert_eq!(chunks.last().unwrap().end, text.chars().count());
    }

    #[test]
    fn recursive_hard_splits_unbroken_text() {
        let doc = Document::new("d", "x".repeat(25));
        let chunks = RecursiveChunker::new(10, 0).unwrap().chunk(&doc);
        assert_eq!(ranges(&chunks), vec![(0, 10), (10, 20), (20, 25)]);
    }

    #[test]
    fn strategy_builds_matching_chunker() {
        let doc = Document::new("d", "a b c d e f g h");
        let fixed = ChunkingStrategy::Fixed.chunker(4, 1).unwrap().chunk(&doc);
        assert_eq!(fixed[0].text, "a b ");
        assert!(ChunkingStrategy::Recursive.chunker(4, 4).is_err());
    }
}

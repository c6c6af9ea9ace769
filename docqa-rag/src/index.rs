//! In-memory vector index using cosine similarity.
//!
//! A [`VectorIndex`] holds every [`IndexEntry`] of one document in insertion
//! order together with the dimensionality of its vectors. It is built once
//! and then only read; a new document produces a new index.

use serde::{Deserialize, Serialize};

use crate::document::{IndexEntry, SearchResult};
use crate::error::{RagError, Result};

/// An immutable set of embedded chunks answering top-k similarity queries.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::VectorIndex;
///
/// let index = VectorIndex::build(entries)?;
/// let results = index.query(&query_embedding, 3)?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from entries, keeping their order.
    ///
    /// The dimensionality is taken from the first entry.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vectors do not all have
    /// the same length, and [`RagError::Config`] if they are empty.
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Ok(Self::new());
        };
        Self::with_dimensions(first.embedding.len(), entries)
    }

    /// Build an index whose vectors must all have `dimensions` entries.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions` is zero and `entries` is
    /// not empty, and [`RagError::DimensionMismatch`] on the first vector of a
    /// different length.
    pub fn with_dimensions(dimensions: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        if !entries.is_empty() && dimensions == 0 {
            return Err(RagError::Config("embedding vectors must be non-empty".to_string()));
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: dimensions,
                actual: bad.embedding.len(),
            });
        }
        Ok(Self { dimensions, entries })
    }

    /// Dimensionality of the indexed vectors, or zero for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The indexed entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// The document the chunks came from, if any.
    pub fn document_id(&self) -> Option<&str> {
        self.entries.first().map(|e| e.chunk.document_id.as_str())
    }

    /// Return the `k` entries most similar to `embedding`.
    ///
    /// Results are sorted by descending cosine similarity; entries with equal
    /// scores keep their insertion order. The result has `min(k, len)`
    /// entries. An empty index yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `embedding` does not match
    /// the index dimensionality.
    pub fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        // `sort_by` is stable, so ties stay in insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn entry(index: usize, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk {
                id: format!("doc_{index}"),
                document_id: "doc".to_string(),
                index,
                text: format!("chunk {index}"),
                start: index * 10,
                end: index * 10 + 10,
                metadata: HashMap::new(),
            },
            embedding,
        }
    }

    #[test]
    fn query_on_empty_index_is_empty() {
        let index = VectorIndex::new();
        assert!(index.query(&[1.0, 0.0], 5).unwrap().is_empty());
        assert_eq!(index.dimensions(), 0);
        assert!(index.document_id().is_none());
    }

    #[test]
    fn build_rejects_inconsistent_lengths() {
        let err = VectorIndex::build(vec![entry(0, vec![1.0, 0.0]), entry(1, vec![1.0])])
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn with_dimensions_rejects_foreign_embedder() {
        let err = VectorIndex::with_dimensions(3, vec![entry(0, vec![1.0, 0.0])]).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn zero_length_vectors_are_a_config_error() {
        let err = VectorIndex::build(vec![entry(0, vec![]), entry(1, vec![])]).unwrap_err();
        assert!(matches!(err, RagError::Config(_)), "got {err:?}");

        let err = VectorIndex::with_dimensions(0, vec![entry(0, vec![])]).unwrap_err();
        assert!(matches!(err, RagError::Config(_)), "got {err:?}");
        assert!(VectorIndex::with_dimensions(0, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn query_rejects_wrong_dimensionality() {
        let index = VectorIndex::build(vec![entry(0, vec![1.0, 0.0])]).unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(RagError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn results_sorted_by_descending_score() {
        let index = VectorIndex::build(vec![
            entry(0, vec![0.0, 1.0]),
            entry(1, vec![1.0, 0.0]),
            entry(2, vec![1.0, 1.0]),
        ])
        .unwrap();

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = VectorIndex::build(vec![
            entry(0, vec![1.0, 0.0]),
            entry(1, vec![2.0, 0.0]),
            entry(2, vec![3.0, 0.0]),
        ])
        .unwrap();

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn result_length_is_min_of_k_and_len() {
        let index =
            VectorIndex::build(vec![entry(0, vec![1.0, 0.0]), entry(1, vec![0.0, 1.0])]).unwrap();
        assert_eq!(index.query(&[1.0, 0.0], 10).unwrap().len(), 2);
        assert_eq!(index.query(&[1.0, 0.0], 1).unwrap().len(), 1);
        assert!(index.query(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}

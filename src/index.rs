//! Ephemeral in-memory vector index for one document.
//!
//! Holds `(vector, chunk)` pairs and answers nearest-neighbour queries by
//! brute-force cosine similarity. The index is built once per upload and is
//! never mutated afterwards, so it needs no locking; replacing the document
//! means dropping the whole index.

use crate::models::{Chunk, ScoredChunk};

struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

pub struct VectorIndex {
    entries: Vec<Entry>,
}

impl VectorIndex {
    /// Pair chunks with their vectors. Both slices must have the same length;
    /// extra items on either side are ignored.
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Self {
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| Entry { chunk, vector })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `limit` chunks most similar to `query_vec`, best first.
    ///
    /// Equal scores keep chunk order, so results are deterministic.
    pub fn search(&self, query_vec: &[f32], limit: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|e| ScoredChunk {
                chunk: e.chunk.clone(),
                score: cosine_similarity(query_vec, &e.vector),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors of
/// different lengths, or a zero-magnitude vector.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            page: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn search_ranks_by_similarity_and_truncates() {
        let index = VectorIndex::build(
            vec![chunk(0, "x axis"), chunk(1, "y axis"), chunk(2, "diagonal")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
        );
        let hits = index.search(&[0.0, 2.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "y axis");
        assert_eq!(hits[1].chunk.text, "diagonal");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn ties_keep_chunk_order() {
        let index = VectorIndex::build(
            vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")],
            vec![vec![1.0], vec![1.0], vec![1.0]],
        );
        let order: Vec<usize> = index.search(&[1.0], 3).iter().map(|h| h.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = VectorIndex::build(Vec::new(), Vec::new());
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 4).is_empty());
    }
}

//! Nearest-neighbor search over stored embeddings.
//!
//! [`FactStore`][crate::store::FactStore] never scans vectors itself; it asks
//! a [`NeighborIndex`]. [`FlatIndex`] is an exact linear scan, which is the
//! right trade-off for small stores. An approximate index can be dropped in
//! through [`FactStore::with_index`][crate::store::FactStore::with_index]
//! without changing any caller.

use graphmem_types::Neighbor;

use crate::similarity::cosine_similarity;

/// Similarity search over vectors addressed by insertion position.
pub trait NeighborIndex: Send + Sync {
    /// Append `vector`; it is addressed by the index's previous length.
    fn insert(&mut self, vector: &[f32]);

    /// Return up to `k` entries most similar to `query`, most similar first.
    ///
    /// Entries below `min_similarity` (when given) are excluded. Equal
    /// similarities are ordered by ascending position.
    fn search(&self, query: &[f32], k: usize, min_similarity: Option<f32>) -> Vec<Neighbor>;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exact O(n) cosine scan.
#[derive(Debug, Default, Clone)]
pub struct FlatIndex {
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NeighborIndex for FlatIndex {
    fn insert(&mut self, vector: &[f32]) {
        self.vectors.push(vector.to_vec());
    }

    fn search(&self, query: &[f32], k: usize, min_similarity: Option<f32>) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, v)| Neighbor {
                index,
                similarity: cosine_similarity(query, v),
            })
            .filter(|n| min_similarity.is_none_or(|min| n.similarity >= min))
            .collect();
        // Stable: ties keep ascending position.
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

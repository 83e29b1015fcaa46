//! Dense seed search with one-hop neighbor expansion.
//!
//! ```text
//! seeds      = top-k facts by cosine(query, fact)
//! candidates = seeds ∪ { n.index | n ∈ seed.neighbors }
//! score(i)   = alpha · cosine(query, fact_i) + (1 − alpha) · recency(ts_i, now)
//! result     = top-2k candidates by score
//! ```
//!
//! The expansion reads the neighbor lists cached at insertion time; nothing
//! is recomputed. Returning `2k` rather than `k` facts is part of the
//! contract: it leaves room for neighbor-reachable context that did not make
//! the seed set.

use std::collections::BTreeSet;

use graphmem_types::{Fact, Timestamp};
use serde::Serialize;
use tracing::debug;

use crate::similarity::{cosine_similarity, recency};
use crate::store::FactStore;

/// A fact returned by [`FactStore::retrieve`] together with its score
/// breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedFact<'a> {
    /// Position of the fact in the store.
    pub index: usize,
    pub fact: &'a Fact,
    pub similarity: f32,
    pub recency: f64,
    /// `alpha · similarity + (1 − alpha) · recency`.
    pub score: f64,
}

impl FactStore {
    /// Rank facts for `query` at time `now`.
    ///
    /// Returns at most `2k` facts, highest score first; equal scores keep
    /// insertion order. `k = 0` and an empty store both return an empty
    /// vector.
    pub fn retrieve(&self, query: &str, now: Timestamp, k: usize) -> Vec<RetrievedFact<'_>> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }
        let query_vec = self.embed(query);
        let seeds = self.index().search(&query_vec, k, None);

        let mut candidates: BTreeSet<usize> = seeds.iter().map(|n| n.index).collect();
        for seed in &seeds {
            if let Some(fact) = self.get(seed.index) {
                candidates.extend(fact.neighbors.iter().map(|n| n.index));
            }
        }

        let alpha = self.config().alpha;
        let mut ranked: Vec<RetrievedFact<'_>> = candidates
            .into_iter()
            .filter_map(|index| {
                let fact = self.get(index)?;
                let similarity = cosine_similarity(&query_vec, &fact.vector);
                let recency = recency(fact.timestamp, now);
                Some(RetrievedFact {
                    index,
                    fact,
                    similarity,
                    recency,
                    score: alpha * f64::from(similarity) + (1.0 - alpha) * recency,
                })
            })
            .collect();

        debug!(
            seeds = seeds.len(),
            candidates = ranked.len(),
            k,
            "retrieval candidates expanded"
        );

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(2 * k);
        ranked
    }
}

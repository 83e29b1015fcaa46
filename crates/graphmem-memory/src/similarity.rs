//! Scoring primitives shared by the retrieval engine and the hybrid ranker.

use std::collections::HashSet;
use std::sync::LazyLock;

use graphmem_types::{SECONDS_PER_DAY, Timestamp};
use regex::Regex;

/// Runs of Unicode letters or digits.
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

/// Compute the cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` if either vector has zero norm
/// (so the zero vector is dissimilar to everything, itself included) or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Day-scaled recency decay in `(0, 1]`.
///
/// ```text
/// recency = 1 / (1 + max(0, (now - timestamp) / 86400))
/// ```
///
/// Facts stamped in the future (clock skew) score as fresh, never above 1.
pub fn recency(timestamp: Timestamp, now: Timestamp) -> f64 {
    let days = ((now - timestamp) / SECONDS_PER_DAY).max(0.0);
    1.0 / (1.0 + days)
}

/// Jaccard overlap `|a ∩ b| / |a ∪ b|`; `0.0` when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

/// Lowercased letter/digit runs of `text`, in order of appearance.
///
/// Punctuation and marker syntax (`Q:`, `[CATEGORY]`) are dropped, so
/// `"PIN?"` and `"pin"` produce the same token.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// [`tokenize`] collected into a set.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds since the Unix epoch. Fractional seconds are allowed.
pub type Timestamp = f64;

/// Seconds in one day; the unit of the recency decay.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// A cached link from a fact to an older, similar fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Position of the linked fact in the store.
    pub index: usize,
    /// Cosine similarity between the two facts at insertion time.
    pub similarity: f32,
}

/// A stored unit of text with its embedding and neighbor links.
///
/// The store hands facts out by shared reference only, so a fact never
/// changes after insertion. Its identity is its position in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub text: String,
    pub timestamp: Timestamp,
    /// Embedding produced by the store's embedder.
    pub vector: Vec<f32>,
    /// Snapshot of the most similar *older* facts, most similar first.
    /// Never revisited after insertion, so older facts do not learn about
    /// newer ones.
    pub neighbors: Vec<Neighbor>,
}

/// Construction-time misconfiguration of a store, ranker, or embedder.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("embedding dimension must be at least 1")]
    ZeroDimension,

    #[error("neighbor limit k must be at least 1")]
    ZeroNeighborLimit,

    #[error("threshold {name} must lie in [-1, 1], got {value}")]
    ThresholdOutOfRange { name: String, value: f64 },

    #[error("weight {name} must lie in [0, 1], got {value}")]
    WeightOutOfRange { name: String, value: f64 },

    #[error("nearest-neighbor index must start empty, got {len} entries")]
    NonEmptyIndex { len: usize },
}

impl ConfigError {
    /// Check that a similarity threshold lies in `[-1, 1]` and is not NaN.
    pub fn check_threshold(name: &str, value: f64) -> Result<(), ConfigError> {
        if (-1.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::ThresholdOutOfRange {
                name: name.to_string(),
                value,
            })
        }
    }

    /// Check that a blend weight lies in `[0, 1]` and is not NaN.
    pub fn check_weight(name: &str, value: f64) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::WeightOutOfRange {
                name: name.to_string(),
                value,
            })
        }
    }
}

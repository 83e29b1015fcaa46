//! Text embedding.
//!
//! The store only depends on the [`Embedder`] contract: a pure,
//! deterministic map from text to a vector whose length never changes.
//! [`HashEmbedder`] is the default, dependency-light implementation; a
//! neural model can replace it without touching the store or the rankers.
//!
//! # Algorithm
//!
//! ```text
//! for token in lowercase(text).split_whitespace():
//!     digest = BLAKE3(token)                  // 32 bytes
//!     for (b0, b1) in digest.chunks(2):
//!         v[b0 % D] += b1 / 255
//! v = v / ‖v‖   (or the zero vector when ‖v‖ = 0)
//! ```
//!
//! Bucket indices come from a single digest byte, so only the first 256
//! buckets are reachable when `D > 256`.

use graphmem_types::ConfigError;

/// Default embedding dimension.
pub const DEFAULT_DIMENSION: usize = 256;

/// Deterministic text → fixed-dimension vector function.
pub trait Embedder: Send + Sync {
    /// Embed `text`. Identical input must yield bit-identical output, and
    /// the returned length must always equal [`dimension`][Self::dimension].
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Length of every vector produced by [`embed`][Self::embed].
    fn dimension(&self) -> usize;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Hash-based bag-of-tokens projection.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of length `dimension`.
    ///
    /// Returns [`ConfigError::ZeroDimension`] when `dimension` is 0.
    pub fn new(dimension: usize) -> Result<Self, ConfigError> {
        if dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        Ok(Self { dimension })
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let digest = blake3::hash(token.as_bytes());
            for pair in digest.as_bytes().chunks_exact(2) {
                let bucket = pair[0] as usize % self.dimension;
                v[bucket] += f32::from(pair[1]) / 255.0;
            }
        }

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "blake3-hash"
    }
}

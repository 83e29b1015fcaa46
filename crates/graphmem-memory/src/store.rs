//! Append-only fact store.
//!
//! # Insertion
//!
//! [`FactStore::add`] embeds the new text, asks the index for the most
//! similar *existing* facts, keeps those at or above `tau`, truncates to
//! `neighbor_k`, and appends the fact with that neighbor list. The new
//! fact's index is the store's previous length.
//!
//! The neighbor graph is deliberately asymmetric: links always point from a
//! newer fact to older ones and are never recomputed, so an old fact does not
//! learn about later similar facts.
//!
//! # Concurrency
//!
//! `add` takes `&mut self`; reads take `&self`. Sharing a store between
//! threads therefore needs an external lock (e.g. `RwLock<FactStore>`).
//!
//! # Example
//!
//! ```rust
//! use graphmem_memory::{FactStore, MemoryConfig};
//!
//! let mut store = FactStore::new(MemoryConfig::default()).unwrap();
//! let first = store.add("card pin change", 0.0);
//! let second = store.add("card pin change", 1.0);
//!
//! assert_eq!((first, second), (0, 1));
//! assert!(store.get(0).unwrap().neighbors.is_empty());
//! assert_eq!(store.get(1).unwrap().neighbors[0].index, 0);
//! ```

use graphmem_types::{ConfigError, Fact, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedder::{DEFAULT_DIMENSION, Embedder, HashEmbedder};
use crate::index::{FlatIndex, NeighborIndex};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning knobs for a [`FactStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Dimension of the default [`HashEmbedder`]. Ignored when a custom
    /// embedder is supplied.
    pub dimension: usize,
    /// Minimum similarity for a neighbor link, in `[-1, 1]`.
    pub tau: f32,
    /// Maximum number of neighbor links per fact.
    pub neighbor_k: usize,
    /// Weight of dense similarity against recency in retrieval, in `[0, 1]`.
    pub alpha: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            tau: 0.35,
            neighbor_k: 5,
            alpha: 0.7,
        }
    }
}

impl MemoryConfig {
    /// Reject configurations that would break the store's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.neighbor_k == 0 {
            return Err(ConfigError::ZeroNeighborLimit);
        }
        ConfigError::check_threshold("tau", f64::from(self.tau))?;
        ConfigError::check_weight("alpha", self.alpha)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FactStore
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, append-only collection of [`Fact`]s with cached neighbor links.
pub struct FactStore {
    config: MemoryConfig,
    embedder: Box<dyn Embedder>,
    index: Box<dyn NeighborIndex>,
    facts: Vec<Fact>,
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore")
            .field("config", &self.config)
            .field("embedder", &self.embedder.name())
            .field("facts", &self.facts.len())
            .finish()
    }
}

impl FactStore {
    /// Create an empty store using the default [`HashEmbedder`] with
    /// `config.dimension` and an exact [`FlatIndex`].
    pub fn new(config: MemoryConfig) -> Result<Self, ConfigError> {
        let embedder = HashEmbedder::new(config.dimension)?;
        Self::with_embedder(config, Box::new(embedder))
    }

    /// Create an empty store with a custom embedder.
    pub fn with_embedder(
        config: MemoryConfig,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self, ConfigError> {
        Self::with_index(config, embedder, Box::new(FlatIndex::new()))
    }

    /// Create an empty store with a custom embedder and nearest-neighbor
    /// index. A non-empty index is rejected with
    /// [`ConfigError::NonEmptyIndex`].
    pub fn with_index(
        config: MemoryConfig,
        embedder: Box<dyn Embedder>,
        index: Box<dyn NeighborIndex>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if embedder.dimension() == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if !index.is_empty() {
            return Err(ConfigError::NonEmptyIndex { len: index.len() });
        }
        debug!(
            embedder = embedder.name(),
            dimension = embedder.dimension(),
            tau = config.tau,
            neighbor_k = config.neighbor_k,
            "fact store created"
        );
        Ok(Self {
            config,
            embedder,
            index,
            facts: Vec::new(),
        })
    }

    /// Embed and append `text`, linking it to its most similar older facts.
    ///
    /// Returns the new fact's index, which equals the previous [`len`][Self::len].
    pub fn add(&mut self, text: &str, timestamp: Timestamp) -> usize {
        let vector = self.embed(text);
        let neighbors = self
            .index
            .search(&vector, self.config.neighbor_k, Some(self.config.tau));
        let index = self.facts.len();

        debug!(index, neighbors = neighbors.len(), "fact added");

        self.index.insert(&vector);
        self.facts.push(Fact {
            text: text.to_string(),
            timestamp,
            vector,
            neighbors,
        });
        index
    }

    /// Embed arbitrary text with the store's embedder.
    ///
    /// A vector whose length differs from the embedder's declared dimension
    /// is replaced by the zero vector, which is similar to nothing.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let vector = self.embedder.embed(text);
        let dimension = self.embedder.dimension();
        if vector.len() == dimension {
            return vector;
        }
        warn!(
            embedder = self.embedder.name(),
            expected = dimension,
            got = vector.len(),
            "embedding dimension mismatch; using zero vector"
        );
        vec![0.0; dimension]
    }

    pub fn get(&self, index: usize) -> Option<&Fact> {
        self.facts.get(index)
    }

    /// All facts in insertion order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub(crate) fn index(&self) -> &dyn NeighborIndex {
        self.index.as_ref()
    }
}

//! `graphmem-memory` – The Fact Graph.
//!
//! An append-only store of short text facts. Every fact is embedded into a
//! fixed-size vector and linked, at insertion time, to its most similar
//! older facts. Queries combine dense similarity, one-hop expansion over the
//! cached links, recency decay, and lexical overlap into a single
//! explainable score.
//!
//! # Modules
//!
//! - [`embedder`] – [`Embedder`][embedder::Embedder] contract and the default
//!   [`HashEmbedder`][embedder::HashEmbedder] (BLAKE3 bag-of-tokens projection).
//! - [`similarity`] – cosine similarity, day-scaled recency decay, Jaccard
//!   overlap and the lexical tokenizer.
//! - [`index`] – [`NeighborIndex`][index::NeighborIndex] seam with the exact
//!   [`FlatIndex`][index::FlatIndex] scan.
//! - [`store`] – [`FactStore`][store::FactStore]: insertion and neighbor
//!   linking.
//! - [`retrieval`] – dense seed search plus one-hop expansion, ranked by a
//!   similarity/recency blend.
//! - [`extract`] – structured field extraction (`Q:`, `A:`, `[CATEGORY]`,
//!   `ALIASES:`) from fact text.
//! - [`ranker`] – [`HybridRanker`][ranker::HybridRanker]: lexical guard,
//!   exact-match boost and the best-answer-or-uncertain response.
//! - [`ingest`] – turns FAQ entries from the external formatting pipeline
//!   into fact text.
//!
//! # Example
//!
//! ```rust
//! use graphmem_memory::{FactStore, HybridRanker, MemoryConfig, RankerConfig};
//!
//! let mut store = FactStore::new(MemoryConfig::default()).unwrap();
//! store.add("Q: How do I reset my password?\nA: Use the login screen link.", 0.0);
//! store.add("Q: How do I close my account?\nA: Visit a branch.", 1.0);
//!
//! let hits = store.retrieve("reset password", 2.0, 1);
//! assert_eq!(hits[0].index, 0);
//!
//! let ranker = HybridRanker::new(&store, RankerConfig::default()).unwrap();
//! let response = ranker.answer("How do I reset my password?", 2.0, 5);
//! assert_eq!(response.answer(), "Use the login screen link.");
//! ```

pub mod embedder;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod ranker;
pub mod retrieval;
pub mod similarity;
pub mod store;

pub use embedder::{DEFAULT_DIMENSION, Embedder, HashEmbedder};
pub use extract::FactFields;
pub use index::{FlatIndex, NeighborIndex};
pub use ingest::{FaqEntry, IngestError, ingest, load_entries};
pub use ranker::{
    AnswerResponse, Candidate, CandidateDiagnostics, ConfidentAnswer, HybridRanker, RankerConfig,
};
pub use retrieval::RetrievedFact;
pub use similarity::{cosine_similarity, jaccard, recency, tokenize};
pub use store::{FactStore, MemoryConfig};

pub use graphmem_types::{ConfigError, Fact, Neighbor, Timestamp};

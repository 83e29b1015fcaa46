//! Hybrid dense + lexical ranking over a [`FactStore`].
//!
//! # Scoring
//!
//! ```text
//! dense = alpha · sim + (1 − alpha) · rec
//! score = (1 − lex_weight) · dense + lex_weight · lex + boost
//! ```
//!
//! * `sim`   – cosine similarity between query and fact embeddings.
//! * `rec`   – day-scaled recency of the fact.
//! * `lex`   – Jaccard overlap of query tokens and fact tokens.
//! * `boost` – `exact_match_boost` when the trimmed, lowercased query equals
//!   the fact's `Q:` line or one of its `ALIASES:`, otherwise `0`.
//!
//! # Lexical guard
//!
//! When the query contains one of the configured guard keywords, the
//! shortlist is restricted to facts sharing at least one token with the
//! query. If that leaves nothing, the unfiltered shortlist is used instead.
//!
//! # Answers
//!
//! [`HybridRanker::answer`] returns the best candidate's answer, or an
//! "uncertain" response with per-candidate diagnostics when both the dense
//! and the lexical signal of the top candidate are weak.

use std::collections::{BTreeSet, HashSet};

use graphmem_types::{ConfigError, Fact, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::FactFields;
use crate::similarity::{jaccard, token_set};
use crate::store::FactStore;

/// Response text when the store holds nothing to rank.
pub const NO_ANSWER: &str = "No answer in memory.";

/// Response text when the best candidate is too weak to trust.
pub const UNCERTAIN_ANSWER: &str = "No confident answer in memory. Try rephrasing the question.";

const DEFAULT_GUARD_KEYWORDS: &[&str] = &[
    "pin",
    "zastrzec",
    "zastrzeż",
    "chargeback",
    "spór",
    "przelew",
    "blokada",
    "karta",
    "limit",
    "limity",
];

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Weights and thresholds for [`HybridRanker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Dense similarity against recency, in `[0, 1]`.
    pub alpha: f64,
    /// Minimum top-candidate similarity for a confident answer, in `[-1, 1]`.
    pub min_sim: f64,
    /// Share of the lexical component in the final score, in `[0, 1]`.
    pub lex_weight: f64,
    /// Bonus for an exact question/alias match, in `[0, 1]`.
    pub exact_match_boost: f64,
    /// Minimum top-candidate lexical overlap for a confident answer.
    pub lex_floor: f64,
    /// Lower bound on the retrieval engine's `k` used to build the shortlist.
    pub shortlist_min: usize,
    /// Lowercase tokens that switch on the lexical guard.
    pub guard_keywords: BTreeSet<String>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            min_sim: 0.5,
            lex_weight: 0.4,
            exact_match_boost: 0.25,
            lex_floor: 0.12,
            shortlist_min: 10,
            guard_keywords: DEFAULT_GUARD_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl RankerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_weight("alpha", self.alpha)?;
        ConfigError::check_weight("lex_weight", self.lex_weight)?;
        ConfigError::check_weight("exact_match_boost", self.exact_match_boost)?;
        ConfigError::check_weight("lex_floor", self.lex_floor)?;
        ConfigError::check_threshold("min_sim", self.min_sim)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidates and responses
// ─────────────────────────────────────────────────────────────────────────────

/// One ranked fact with its full score breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate<'a> {
    /// Position of the fact in the store.
    pub index: usize,
    pub fact: &'a Fact,
    pub sim: f64,
    pub rec: f64,
    pub lex: f64,
    pub boost: f64,
    pub score: f64,
    pub fields: FactFields,
}

/// Diagnostics exposed for every candidate of an uncertain answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateDiagnostics {
    /// First two lines of the fact text.
    pub preview: Vec<String>,
    pub score: f64,
    pub sim: f64,
    pub lex: f64,
    pub recency: f64,
    pub category: Option<String>,
    pub question: String,
    pub aliases: Vec<String>,
}

/// A runner-up offered next to a confident answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub answer: String,
    pub category: Option<String>,
    pub question: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidentAnswer {
    pub answer: String,
    pub category: Option<String>,
    pub matched_question: Option<String>,
    pub score: f64,
    pub sim: f64,
    pub lex: f64,
    pub recency: f64,
    /// Up to two runner-up candidates.
    pub alternatives: Vec<Alternative>,
}

/// Result of [`HybridRanker::answer`]. All scores are rounded to three
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerResponse {
    /// Nothing to rank; `answer` is [`NO_ANSWER`] and `candidates` is empty.
    NoAnswer {
        answer: String,
        candidates: Vec<CandidateDiagnostics>,
    },
    /// `answer` is [`UNCERTAIN_ANSWER`]; `candidates` lets the caller
    /// disambiguate.
    Uncertain {
        answer: String,
        candidates: Vec<CandidateDiagnostics>,
    },
    Confident(ConfidentAnswer),
}

impl AnswerResponse {
    fn no_answer() -> Self {
        AnswerResponse::NoAnswer {
            answer: NO_ANSWER.to_string(),
            candidates: Vec::new(),
        }
    }

    /// The answer text of any variant.
    pub fn answer(&self) -> &str {
        match self {
            AnswerResponse::NoAnswer { answer, .. } | AnswerResponse::Uncertain { answer, .. } => {
                answer
            }
            AnswerResponse::Confident(c) => &c.answer,
        }
    }

    pub fn is_confident(&self) -> bool {
        matches!(self, AnswerResponse::Confident(_))
    }

    /// Diagnostics of an uncertain answer; empty for the other variants.
    pub fn candidates(&self) -> &[CandidateDiagnostics] {
        match self {
            AnswerResponse::NoAnswer { candidates, .. }
            | AnswerResponse::Uncertain { candidates, .. } => candidates,
            AnswerResponse::Confident(_) => &[],
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

// ─────────────────────────────────────────────────────────────────────────────
// HybridRanker
// ─────────────────────────────────────────────────────────────────────────────

/// Hybrid ranker over a borrowed [`FactStore`].
///
/// Token sets and structured fields are extracted once at construction.
/// The borrow keeps the store from growing while the ranker is alive, so
/// the precomputed data always covers every fact; build a new ranker after
/// adding facts.
pub struct HybridRanker<'a> {
    store: &'a FactStore,
    config: RankerConfig,
    terms: Vec<HashSet<String>>,
    fields: Vec<FactFields>,
}

impl<'a> HybridRanker<'a> {
    /// Index `store` for hybrid ranking.
    ///
    /// Guard keywords are lowercased to match query tokens. Returns a
    /// [`ConfigError`] if any weight or threshold is out of range.
    pub fn new(store: &'a FactStore, mut config: RankerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        config.guard_keywords = config
            .guard_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        let terms = store.facts().iter().map(|f| token_set(&f.text)).collect();
        let fields = store
            .facts()
            .iter()
            .map(|f| FactFields::parse(&f.text))
            .collect();
        debug!(facts = store.len(), "hybrid ranker indexed");
        Ok(Self {
            store,
            config,
            terms,
            fields,
        })
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Extracted fields of the fact at `index`.
    pub fn fields(&self, index: usize) -> Option<&FactFields> {
        self.fields.get(index)
    }

    /// Rank up to `k` candidates for `query` at time `now`, best first.
    pub fn retrieve(&self, query: &str, now: Timestamp, k: usize) -> Vec<Candidate<'a>> {
        let shortlist_k = self.config.shortlist_min.max(k);
        let mut shortlist = self.store.retrieve(query, now, shortlist_k);

        let query_terms = token_set(query);
        let guarded = query_terms
            .iter()
            .any(|t| self.config.guard_keywords.contains(t));
        if guarded {
            let before = shortlist.len();
            let filtered: Vec<_> = shortlist
                .iter()
                .filter(|hit| !query_terms.is_disjoint(&self.terms[hit.index]))
                .cloned()
                .collect();
            if !filtered.is_empty() {
                shortlist = filtered;
            }
            debug!(before, after = shortlist.len(), "lexical guard applied");
        }

        let normalized = query.trim().to_lowercase();
        let alpha = self.config.alpha;
        let lex_weight = self.config.lex_weight;

        let mut out: Vec<Candidate<'a>> = shortlist
            .into_iter()
            .map(|hit| {
                let fields = &self.fields[hit.index];
                let sim = f64::from(hit.similarity);
                let rec = hit.recency;
                let lex = jaccard(&query_terms, &self.terms[hit.index]);
                let boost = if fields.exact_match(&normalized) {
                    self.config.exact_match_boost
                } else {
                    0.0
                };
                let dense = alpha * sim + (1.0 - alpha) * rec;
                Candidate {
                    index: hit.index,
                    fact: hit.fact,
                    sim,
                    rec,
                    lex,
                    boost,
                    score: (1.0 - lex_weight) * dense + lex_weight * lex + boost,
                    fields: fields.clone(),
                }
            })
            .collect();

        out.sort_by(|a, b| b.score.total_cmp(&a.score));
        out.truncate(k);
        out
    }

    /// Answer `query` from the top `k` candidates.
    pub fn answer(&self, query: &str, now: Timestamp, k: usize) -> AnswerResponse {
        let candidates = self.retrieve(query, now, k);
        let Some(best) = candidates.first() else {
            debug!("no candidates; answering from empty memory");
            return AnswerResponse::no_answer();
        };

        if best.sim < self.config.min_sim && best.lex < self.config.lex_floor {
            debug!(
                sim = best.sim,
                lex = best.lex,
                candidates = candidates.len(),
                "top candidate below confidence floor"
            );
            return AnswerResponse::Uncertain {
                answer: UNCERTAIN_ANSWER.to_string(),
                candidates: candidates.iter().map(diagnostics).collect(),
            };
        }

        debug!(index = best.index, score = best.score, "confident answer");
        AnswerResponse::Confident(ConfidentAnswer {
            answer: best.fields.answer.clone(),
            category: best.fields.category.clone(),
            matched_question: best.fields.matched_question().map(str::to_string),
            score: round3(best.score),
            sim: round3(best.sim),
            lex: round3(best.lex),
            recency: round3(best.rec),
            alternatives: candidates
                .iter()
                .skip(1)
                .take(2)
                .map(|c| Alternative {
                    answer: c.fields.answer.clone(),
                    category: c.fields.category.clone(),
                    question: c.fields.question.clone(),
                    score: round3(c.score),
                })
                .collect(),
        })
    }
}

fn diagnostics(c: &Candidate<'_>) -> CandidateDiagnostics {
    CandidateDiagnostics {
        preview: c.fact.text.lines().take(2).map(str::to_string).collect(),
        score: round3(c.score),
        sim: round3(c.sim),
        lex: round3(c.lex),
        recency: round3(c.rec),
        category: c.fields.category.clone(),
        question: c.fields.question.clone(),
        aliases: c.fields.aliases.clone(),
    }
}

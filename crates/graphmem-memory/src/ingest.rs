//! FAQ ingestion.
//!
//! The FAQ formatting pipeline emits a JSON array of entries:
//!
//! ```json
//! [{ "id": 1, "category": "card", "q": "Jak zmienić PIN?", "a": "W aplikacji.",
//!    "aliases": ["Zmiana PIN"], "next_steps": ["Otwórz aplikację"], "tags": ["pin"] }]
//! ```
//!
//! Each entry is rendered to marker-formatted text (see
//! [`extract`][crate::extract]) and added to the store. Entry `i` is stamped
//! `base_timestamp + i` seconds so later entries count as marginally fresher.

use std::path::Path;

use graphmem_types::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::store::FactStore;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read FAQ file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse FAQ file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One FAQ entry as produced by the formatting pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "q", default)]
    pub question: String,
    #[serde(rename = "a", default)]
    pub answer: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FaqEntry {
    /// Render the entry as fact text. Empty optional sections are omitted.
    ///
    /// ```rust
    /// use graphmem_memory::FaqEntry;
    ///
    /// let entry = FaqEntry {
    ///     category: "card".into(),
    ///     question: "Jak zmienić PIN?".into(),
    ///     answer: "W aplikacji.".into(),
    ///     aliases: vec!["Zmiana PIN".into(), "Nowy PIN".into()],
    ///     ..FaqEntry::default()
    /// };
    /// assert_eq!(
    ///     entry.to_fact_text(),
    ///     "[CATEGORY] card\nQ: Jak zmienić PIN?\nA: W aplikacji.\nALIASES: Zmiana PIN, Nowy PIN"
    /// );
    /// ```
    pub fn to_fact_text(&self) -> String {
        let mut lines = vec![
            format!("[CATEGORY] {}", self.category),
            format!("Q: {}", self.question),
            format!("A: {}", self.answer),
        ];
        if !self.aliases.is_empty() {
            lines.push(format!("ALIASES: {}", self.aliases.join(", ")));
        }
        if !self.next_steps.is_empty() {
            lines.push("NEXT_STEPS:".to_string());
            lines.extend(self.next_steps.iter().map(|s| format!("- {s}")));
        }
        if !self.tags.is_empty() {
            lines.push(format!("TAGS: {}", self.tags.join(", ")));
        }
        lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Load a JSON array of [`FaqEntry`] from `path`.
pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<FaqEntry>, IngestError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| IngestError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Add every entry to `store` in order; returns the new fact indices.
pub fn ingest(store: &mut FactStore, entries: &[FaqEntry], base_timestamp: Timestamp) -> Vec<usize> {
    let ids: Vec<usize> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| store.add(&entry.to_fact_text(), base_timestamp + i as f64))
        .collect();
    info!(entries = ids.len(), total = store.len(), "FAQ entries ingested");
    ids
}

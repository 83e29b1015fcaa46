//! [`Generator`] – pluggable text generation for the agent.
//!
//! The agent hands a generator one prompt string built from `### FACT`
//! blocks (see [`MemoryAgent::build_prompt`][crate::agent::MemoryAgent::build_prompt])
//! and stores whatever text comes back. [`HeuristicGenerator`] answers
//! straight from those blocks without a model;
//! [`LlmDriver`][crate::llm_driver::LlmDriver] forwards the prompt to an
//! OpenAI-compatible server.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Marker that opens every fact block in an agent prompt.
pub const FACT_MARKER: &str = "### FACT\n";

/// Reply of [`HeuristicGenerator`] when the prompt carries no fact blocks.
pub const FALLBACK_ANSWER: &str = "I don't know based on the provided facts.";

static ANSWER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^A:\s*(.+)$").unwrap());

/// Errors a [`Generator`] can report.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The backing model could not be reached.
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    /// The backing model answered with something unusable.
    #[error("generator returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Turns a prompt into answer text.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Model-free generator that lifts the answer out of the prompt's facts.
///
/// 1. The first `A:` line found while scanning fact blocks in order.
/// 2. Otherwise the second non-empty line of the first block, or its first
///    line when it has only one.
/// 3. Otherwise [`FALLBACK_ANSWER`].
///
/// ```rust
/// use graphmem_runtime::{Generator, HeuristicGenerator};
///
/// let prompt = "### FACT\nQ: Jak zmienić PIN?\nA: W aplikacji.\n\nUser: pin\nAnswer: ";
/// assert_eq!(HeuristicGenerator.generate(prompt).unwrap(), "W aplikacji.");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicGenerator;

impl Generator for HeuristicGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let blocks = fact_blocks(prompt);

        for block in &blocks {
            if let Some(m) = ANSWER_LINE_RE.captures(block).and_then(|c| c.get(1)) {
                return Ok(m.as_str().trim().to_string());
            }
        }

        let lines: Vec<&str> = blocks
            .first()
            .map(|b| b.lines().map(str::trim).filter(|l| !l.is_empty()).collect())
            .unwrap_or_default();
        let picked = lines.get(1).or_else(|| lines.first());
        Ok(picked.map_or_else(|| FALLBACK_ANSWER.to_string(), |l| l.to_string()))
    }
}

/// Bodies of the `### FACT` blocks in `prompt`, in order. A block runs to
/// the next marker line or to the end of the prompt.
fn fact_blocks(prompt: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = prompt;
    while let Some(start) = rest.find(FACT_MARKER) {
        let body = &rest[start + FACT_MARKER.len()..];
        let end = body.find("\n### FACT").unwrap_or(body.len());
        blocks.push(&body[..end]);
        rest = &body[end..];
    }
    blocks
}

//! [`MemoryAgent`] – a memory-backed conversational turn loop.
//!
//! Each turn retrieves context from the owned [`FactStore`], builds a prompt
//! of `### FACT` blocks, asks the [`Generator`] for an answer, and writes
//! both sides of the exchange back into the store:
//!
//! ```text
//! retrieve(user_msg, now, top_k) ─► build_prompt ─► generate ─► add("USER: …") ─► add("ASSISTANT: …")
//! ```
//!
//! Later turns can therefore recall earlier ones through the same retrieval
//! path as FAQ facts.

use chrono::Utc;
use graphmem_memory::{AnswerResponse, FactStore, HybridRanker, RankerConfig};
use graphmem_types::{ConfigError, Fact, Timestamp};
use thiserror::Error;
use tracing::{debug, warn};

use crate::generator::{FACT_MARKER, GenerateError, Generator, HeuristicGenerator};

/// Instruction text placed at the top of every prompt.
pub const DEFAULT_PREAMBLE: &str = "You are a banking FAQ assistant. Use ONLY the provided facts to answer.\n\
                                    If the answer is not covered, say you don't know.";

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Tunables for [`MemoryAgent`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// `k` passed to retrieval for each turn.
    pub top_k: usize,
    pub preamble: String,
    /// Used by [`MemoryAgent::answer`].
    pub ranker: RankerConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            preamble: DEFAULT_PREAMBLE.to_string(),
            ranker: RankerConfig::default(),
        }
    }
}

/// Owns a [`FactStore`] and a [`Generator`].
pub struct MemoryAgent {
    memory: FactStore,
    generator: Box<dyn Generator>,
    config: AgentConfig,
}

impl MemoryAgent {
    /// An agent answering with [`HeuristicGenerator`].
    pub fn new(memory: FactStore) -> Self {
        Self::with_generator(memory, Box::new(HeuristicGenerator))
    }

    pub fn with_generator(memory: FactStore, generator: Box<dyn Generator>) -> Self {
        Self {
            memory,
            generator,
            config: AgentConfig::default(),
        }
    }

    /// Replace the default configuration after checking the ranker part.
    pub fn with_config(mut self, config: AgentConfig) -> Result<Self, AgentError> {
        config.ranker.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn memory(&self) -> &FactStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut FactStore {
        &mut self.memory
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Render the prompt for one turn.
    ///
    /// ```rust
    /// use graphmem_memory::{FactStore, MemoryConfig};
    /// use graphmem_runtime::MemoryAgent;
    ///
    /// let mut store = FactStore::new(MemoryConfig::default()).unwrap();
    /// store.add("A: Use the app.", 0.0);
    /// let agent = MemoryAgent::new(store);
    /// let fact = agent.memory().get(0).unwrap();
    /// let prompt = agent.build_prompt("How?", &[fact]);
    /// assert!(prompt.contains("### FACT\nA: Use the app."));
    /// assert!(prompt.ends_with("User: How?\nAnswer: "));
    /// ```
    pub fn build_prompt(&self, user_msg: &str, context: &[&Fact]) -> String {
        let context_text = context
            .iter()
            .map(|f| format!("{FACT_MARKER}{}", f.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "{}\n\n{}\n\nUser: {}\nAnswer: ",
            self.config.preamble, context_text, user_msg
        )
    }

    /// Run one turn at time `now` and return the generated answer.
    ///
    /// The exchange is stored only when generation succeeds.
    pub fn reply_at(&mut self, user_msg: &str, now: Timestamp) -> Result<String, AgentError> {
        let prompt = {
            let hits = self.memory.retrieve(user_msg, now, self.config.top_k);
            let context: Vec<&Fact> = hits.iter().map(|h| h.fact).collect();
            debug!(context = context.len(), "agent prompt built");
            self.build_prompt(user_msg, &context)
        };

        let answer = self.generator.generate(&prompt).inspect_err(|e| {
            warn!(error = %e, "generator failed; turn not stored");
        })?;

        self.memory.add(&format!("USER: {user_msg}"), now);
        self.memory.add(&format!("ASSISTANT: {answer}"), now);
        Ok(answer)
    }

    /// [`reply_at`][Self::reply_at] with the current wall-clock time.
    pub fn reply(&mut self, user_msg: &str) -> Result<String, AgentError> {
        self.reply_at(user_msg, now())
    }

    /// Hybrid-ranked answer over the current memory contents.
    pub fn answer(&self, query: &str, now: Timestamp, k: usize) -> Result<AnswerResponse, AgentError> {
        let ranker = HybridRanker::new(&self.memory, self.config.ranker.clone())?;
        Ok(ranker.answer(query, now, k))
    }
}

/// Seconds since the Unix epoch, with millisecond precision.
pub fn now() -> Timestamp {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmem_memory::MemoryConfig;
    use std::sync::{Arc, Mutex};

    /// Records every prompt and answers with a fixed string.
    struct Recording {
        prompts: Arc<Mutex<Vec<String>>>,
        reply: Result<String, ()>,
    }

    impl Generator for Recording {
        fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| GenerateError::Unavailable("offline".into()))
        }
    }

    fn faq_store() -> FactStore {
        let mut store = FactStore::new(MemoryConfig::default()).unwrap();
        store.add(
            "[CATEGORY] card\nQ: Jak zmienić PIN do karty?\nA: PIN zmienisz w aplikacji.",
            0.0,
        );
        store.add(
            "[CATEGORY] transfers\nQ: Ile trwa przelew?\nA: Przelew trwa jeden dzień roboczy.",
            1.0,
        );
        store
    }

    #[test]
    fn heuristic_reply_uses_retrieved_answer() {
        let mut agent = MemoryAgent::new(faq_store());
        let answer = agent.reply_at("Jak zmienić PIN do karty?", 10.0).unwrap();
        assert_eq!(answer, "PIN zmienisz w aplikacji.");
    }

    #[test]
    fn reply_stores_both_sides_of_the_turn() {
        let mut agent = MemoryAgent::new(faq_store());
        let answer = agent.reply_at("Ile trwa przelew?", 42.0).unwrap();
        let facts = agent.memory().facts();
        assert_eq!(facts.len(), 4);
        assert_eq!(facts[2].text, "USER: Ile trwa przelew?");
        assert_eq!(facts[3].text, format!("ASSISTANT: {answer}"));
        assert_eq!(facts[2].timestamp, 42.0);
        assert_eq!(facts[3].timestamp, 42.0);
    }

    #[test]
    fn empty_memory_replies_with_fallback() {
        let store = FactStore::new(MemoryConfig::default()).unwrap();
        let mut agent = MemoryAgent::new(store);
        let answer = agent.reply_at("anything", 0.0).unwrap();
        assert_eq!(answer, crate::generator::FALLBACK_ANSWER);
    }

    #[test]
    fn prompt_carries_preamble_and_retrieved_facts() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = Recording {
            prompts: Arc::clone(&prompts),
            reply: Ok("ok".into()),
        };
        let mut agent = MemoryAgent::with_generator(faq_store(), Box::new(generator))
            .with_config(AgentConfig {
                top_k: 1,
                preamble: "PREAMBLE".into(),
                ..AgentConfig::default()
            })
            .unwrap();
        agent.reply_at("Ile trwa przelew?", 5.0).unwrap();

        let prompts = prompts.lock().unwrap();
        assert!(prompts[0].starts_with("PREAMBLE\n\n### FACT\n"));
        assert!(prompts[0].contains("Q: Ile trwa przelew?"));
        assert!(prompts[0].ends_with("User: Ile trwa przelew?\nAnswer: "));
    }

    #[test]
    fn generator_failure_propagates_and_stores_nothing() {
        let generator = Recording {
            prompts: Arc::new(Mutex::new(Vec::new())),
            reply: Err(()),
        };
        let mut agent = MemoryAgent::with_generator(faq_store(), Box::new(generator));
        let err = agent.reply_at("Ile trwa przelew?", 5.0).unwrap_err();
        assert!(matches!(err, AgentError::Generate(GenerateError::Unavailable(_))));
        assert_eq!(agent.memory().len(), 2);
    }

    #[test]
    fn earlier_turns_are_recalled() {
        let store = FactStore::new(MemoryConfig::default()).unwrap();
        let mut agent = MemoryAgent::new(store);
        agent.reply_at("moja karta nazywa się złota", 0.0).unwrap();
        let hits = agent.memory().retrieve("karta złota", 1.0, 1);
        assert_eq!(hits[0].fact.text, "USER: moja karta nazywa się złota");
    }

    // ── answer ───────────────────────────────────────────────────────────────

    #[test]
    fn answer_delegates_to_hybrid_ranker() {
        let agent = MemoryAgent::new(faq_store());
        let response = agent.answer("Jak zmienić PIN do karty?", 10.0, 5).unwrap();
        assert!(response.is_confident());
        assert_eq!(response.answer(), "PIN zmienisz w aplikacji.");
    }

    #[test]
    fn invalid_ranker_config_is_rejected() {
        let config = AgentConfig {
            ranker: RankerConfig {
                lex_weight: 1.5,
                ..RankerConfig::default()
            },
            ..AgentConfig::default()
        };
        let err = MemoryAgent::new(faq_store()).with_config(config).err().unwrap();
        assert!(matches!(err, AgentError::Config(ConfigError::WeightOutOfRange { .. })));
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now() > 1_577_836_800.0);
    }
}

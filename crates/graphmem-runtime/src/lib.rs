//! `graphmem-runtime` – orchestration around the graph memory.
//!
//! # Modules
//!
//! - [`agent`] – [`MemoryAgent`][agent::MemoryAgent]: owns a
//!   [`FactStore`][graphmem_memory::FactStore], builds `### FACT` prompts
//!   from retrieved context, invokes a [`Generator`][generator::Generator],
//!   and writes each turn back into memory.
//! - [`generator`] – the [`Generator`][generator::Generator] seam and
//!   [`HeuristicGenerator`][generator::HeuristicGenerator], which answers
//!   straight from the prompt's facts.
//! - [`llm_driver`] – [`LlmDriver`][llm_driver::LlmDriver]: a blocking
//!   OpenAI-compatible client for local models such as
//!   [Ollama](https://ollama.com). [`GROUNDING_GUIDELINES`][llm_driver::GROUNDING_GUIDELINES]
//!   are injected into every system-role message.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod agent;
pub mod generator;
pub mod llm_driver;
pub mod telemetry;

pub use agent::{AgentConfig, AgentError, DEFAULT_PREAMBLE, MemoryAgent};
pub use generator::{FALLBACK_ANSWER, GenerateError, Generator, HeuristicGenerator};
pub use llm_driver::{ChatMessage, GROUNDING_GUIDELINES, LlmDriver, LlmError, Role};
pub use telemetry::{TracerProviderGuard, init_tracing};

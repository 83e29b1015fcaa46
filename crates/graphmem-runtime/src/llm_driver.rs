//! [`LlmDriver`] – OpenAI-compatible chat-completions client.
//!
//! Talks to any server exposing `/v1/chat/completions`, such as
//! [Ollama](https://ollama.com) (`http://localhost:11434`). The driver is a
//! [`Generator`], so a [`MemoryAgent`][crate::agent::MemoryAgent] can swap
//! the heuristic generator for a real model without other changes.
//!
//! # Example
//!
//! ```rust,no_run
//! use graphmem_runtime::llm_driver::{ChatMessage, LlmDriver, Role};
//!
//! let driver = LlmDriver::new("http://localhost:11434", "llama3");
//!
//! let messages = vec![
//!     ChatMessage { role: Role::System, content: "You are a banking FAQ assistant.".into() },
//!     ChatMessage { role: Role::User, content: "How do I change my PIN?".into() },
//! ];
//!
//! // Requires a running model server.
//! // let reply = driver.complete(&messages).unwrap();
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::generator::{GenerateError, Generator};

// ─────────────────────────────────────────────────────────────────────────────
// Grounding guidelines
// ─────────────────────────────────────────────────────────────────────────────

/// Rules appended to every system-role message so the model answers only
/// from the facts it was given.
pub const GROUNDING_GUIDELINES: &str = "\
## Grounding Guidelines
- Answer using ONLY the facts provided in the conversation.
- If the facts do not cover the question, say that you don't know.
- Do not invent account numbers, fees, limits, or deadlines.
- Keep the answer short and quote the relevant fact when possible.";

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from LLM driver operations.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The HTTP request to the model server failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The response from the model server could not be parsed.
    #[error("Unexpected response format: {0}")]
    BadResponse(String),
}

impl From<LlmError> for GenerateError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(e) => GenerateError::Unavailable(e.to_string()),
            LlmError::BadResponse(msg) => GenerateError::InvalidResponse(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message types (OpenAI-compatible)
// ─────────────────────────────────────────────────────────────────────────────

/// The role of a participant in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

// ─────────────────────────────────────────────────────────────────────────────
// LlmDriver
// ─────────────────────────────────────────────────────────────────────────────

/// A blocking client for an OpenAI-compatible chat-completions endpoint.
///
/// Construct once and reuse across turns.
pub struct LlmDriver {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl fmt::Debug for LlmDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmDriver")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl LlmDriver {
    /// Create a new driver pointing at `base_url` (e.g. `"http://localhost:11434"`)
    /// and using `model` (e.g. `"llama3"`).
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `messages` to the model and return the assistant's reply text.
    ///
    /// [`GROUNDING_GUIDELINES`] are appended to every [`Role::System`]
    /// message; when `messages` has none, a system message holding only the
    /// guidelines is prepended.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the request fails, or
    /// [`LlmError::BadResponse`] if the response shape is unexpected.
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let augmented = with_guidelines(messages);
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: &augmented,
            stream: false,
        };

        debug!(%url, model = %self.model, messages = augmented.len(), "chat completion request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response: ChatResponse = request.send()?.error_for_status()?.json()?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::BadResponse("empty choices array".into()))
    }
}

impl Generator for LlmDriver {
    /// The whole agent prompt is sent as one user message.
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let messages = [ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        }];
        let reply = self.complete(&messages)?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GenerateError::InvalidResponse("empty completion".into()));
        }
        Ok(reply.to_string())
    }
}

fn with_guidelines(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut augmented: Vec<ChatMessage> = messages
        .iter()
        .map(|m| {
            if m.role == Role::System {
                ChatMessage {
                    role: Role::System,
                    content: format!("{}\n\n{}", m.content, GROUNDING_GUIDELINES),
                }
            } else {
                m.clone()
            }
        })
        .collect();

    if !augmented.iter().any(|m| m.role == Role::System) {
        augmented.insert(
            0,
            ChatMessage {
                role: Role::System,
                content: GROUNDING_GUIDELINES.to_string(),
            },
        );
    }
    augmented
}

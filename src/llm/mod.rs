//! Chat-completion client for name extraction.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (Ollama's
//! `/v1` API by default). The pipeline only depends on the [`ChatBackend`]
//! trait, so tests and alternative transports plug in without HTTP.

pub mod conversation;

use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use conversation::{Conversation, FewShotExample};

/// Errors from the LLM subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    #[error("chat request to {url} failed: {message}")]
    #[diagnostic(
        code(indexer::llm::request_failed),
        help(
            "Check that the server is running (e.g. `ollama serve`), that `llm.base_url` \
             points at its OpenAI-compatible API and that the model is pulled."
        )
    )]
    RequestFailed { url: String, message: String },

    #[error("failed to parse chat response: {message}")]
    #[diagnostic(
        code(indexer::llm::parse_error),
        help("The server returned an unexpected response format.")
    )]
    ParseError { message: String },
}

/// Configuration for the chat-completion client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    /// Sampling temperature (0-2).
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Maximum tokens in a completion.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            model: "phi3:14b-medium-128k-instruct-q8_0".into(),
            temperature: 0.25,
            top_p: 1.0,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message for multi-turn conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Something that answers a chat history with the assistant's reply.
pub trait ChatBackend {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Blocking client for an OpenAI-compatible chat-completion API.
pub struct ChatClient {
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Get the model name being used.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_tokens": self.config.max_tokens,
        })
    }
}

impl ChatBackend for ChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = self.endpoint();
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build();

        let body_str =
            serde_json::to_string(&self.request_body(messages)).map_err(|e| {
                LlmError::RequestFailed {
                    url: url.clone(),
                    message: format!("JSON serialize error: {e}"),
                }
            })?;

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e: ureq::Error| LlmError::RequestFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let resp_str = resp.into_string().map_err(|e| LlmError::ParseError {
            message: e.to_string(),
        })?;

        parse_completion(&resp_str)
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| LlmError::ParseError {
        message: e.to_string(),
    })?;

    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| LlmError::ParseError {
            message: "missing 'choices[0].message.content' field".into(),
        })
}

//! Conversation history sent with every chat request.
//!
//! The preamble (system prompt plus few-shot examples) survives
//! [`Conversation::reset`]; user and assistant turns do not.

use serde::{Deserialize, Serialize};

use super::{ChatBackend, ChatMessage, LlmError};

/// One worked example shown to the model before the real request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    preamble: Vec<ChatMessage>,
    turns: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            preamble: vec![ChatMessage::system(system_prompt)],
            turns: Vec::new(),
        }
    }

    /// Append few-shot examples to the preamble as user/assistant pairs.
    pub fn with_examples(mut self, examples: &[FewShotExample]) -> Self {
        for example in examples {
            self.preamble.push(ChatMessage::user(example.user.clone()));
            self.preamble
                .push(ChatMessage::assistant(example.assistant.clone()));
        }
        self
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::assistant(content));
    }

    /// Preamble followed by the turns so far.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.preamble.iter().chain(&self.turns).cloned().collect()
    }

    /// Number of user/assistant turns since the last reset.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Drop every turn, keeping the preamble.
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Send a user message and record the reply in the history.
    pub fn send(&mut self, backend: &dyn ChatBackend, user: impl Into<String>) -> Result<String, LlmError> {
        self.push_user(user);
        let reply = backend.complete(&self.messages())?;
        self.push_assistant(reply.clone());
        Ok(reply)
    }
}

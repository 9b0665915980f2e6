//! Chat boundary types

use serde::{Deserialize, Serialize};

/// Message role as sent upstream
///
/// Outgoing role values are restricted to `system`, `user`, and `assistant`;
/// caller-supplied synonyms are normalized via [`Role::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Map a caller-supplied role string onto the three wire roles
    ///
    /// Unknown values fall back to `user` so a sloppy caller still gets a
    /// well-formed message list.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "system" => Self::System,
            "assistant" | "bot" | "ai" | "model" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// A single turn of caller-supplied conversation history
///
/// The role is kept as the caller sent it and normalized at prompt-assembly
/// time; history is caller-owned state, never persisted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Caller-supplied role (`user`, `assistant`, or a synonym)
    pub role: String,
    /// Text content of the turn
    pub content: String,
}

impl ConversationTurn {
    /// Create a turn
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Chat request accepted at the chat boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user message
    pub message: String,

    /// Prior conversation turns, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,

    /// Requested model identifier (default from the original backend)
    #[serde(default = "default_model")]
    pub model: String,

    /// Quota identity; a single shared key when no per-user binding exists
    #[serde(default = "default_quota_key")]
    pub quota_key: String,
}

fn default_model() -> String {
    "meta/llama-3.1-405b-instruct".to_string()
}

fn default_quota_key() -> String {
    "global".to_string()
}

impl ChatRequest {
    /// Create a request with default model and quota key
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            model: default_model(),
            quota_key: default_quota_key(),
        }
    }

    /// Set the requested model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the conversation history
    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    /// Set the quota identity
    pub fn with_quota_key(mut self, key: impl Into<String>) -> Self {
        self.quota_key = key.into();
        self
    }
}

/// Chat response returned at the chat boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's answer (or the quota apology on denial)
    pub response: String,
    /// Ordered, human-readable trace of the orchestration steps
    pub thoughts: Vec<String>,
}

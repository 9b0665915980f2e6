//! Prompt assembly: persona, retrieved context, bounded history, new turn

use serde::Serialize;

use crate::config::PersonaConfig;
use crate::types::{ConversationTurn, Role};

/// A message as sent to the upstream provider
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub role: Role,
    pub content: String,
}

impl OutboundMessage {
    /// Create a message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Builds the ordered message list for one turn
///
/// Order is always persona system message, then history, then the new user
/// turn. History is truncated to the most recent `history_limit` turns;
/// older turns are silently dropped.
pub struct PromptAssembler {
    persona: String,
    history_limit: usize,
}

impl PromptAssembler {
    /// Create an assembler from the persona configuration
    pub fn new(config: &PersonaConfig) -> Self {
        Self {
            persona: config.system_prompt.clone(),
            history_limit: config.history_limit,
        }
    }

    /// Assemble the full message list
    ///
    /// `context` is the retriever's joined context; when empty, the system
    /// message is the bare persona with no context block.
    pub fn assemble(
        &self,
        context: &str,
        history: &[ConversationTurn],
        message: &str,
    ) -> Vec<OutboundMessage> {
        let mut messages = Vec::with_capacity(history.len().min(self.history_limit) + 2);

        let system = if context.is_empty() {
            self.persona.clone()
        } else {
            format!(
                "{}\n\nUse the following context if it is relevant to the conversation:\n{}",
                self.persona, context
            )
        };
        messages.push(OutboundMessage::new(Role::System, system));

        let start = history.len().saturating_sub(self.history_limit);
        for turn in &history[start..] {
            messages.push(OutboundMessage::new(
                Role::normalize(&turn.role),
                turn.content.clone(),
            ));
        }

        messages.push(OutboundMessage::new(Role::User, message));
        messages
    }
}

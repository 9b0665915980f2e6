//! Prompt assembly for upstream generation

pub mod prompt;

pub use prompt::{OutboundMessage, PromptAssembler};

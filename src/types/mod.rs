//! Core types shared across the gateway

pub mod chat;
pub mod document;

pub use chat::{ChatRequest, ChatResponse, ConversationTurn, Role};
pub use document::{Chunk, Document};

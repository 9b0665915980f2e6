//! noddy-rag: conversational assistant gateway with retrieval-augmented
//! generation
//!
//! Augments each chat turn with context retrieved from an ingested document
//! store, routes the turn to one of several interchangeable model providers
//! with capability-aware fallback, bounds usage against a daily quota, and
//! returns the answer together with a rendered trace of its own steps.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod orchestrator;
pub mod providers;
pub mod quota;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use types::{ChatRequest, ChatResponse, Chunk, ConversationTurn, Document, Role};

//! Provider abstractions: embeddings, upstream routing, and chat dispatch

pub mod chat;
pub mod embedding;
pub mod router;

pub use chat::{ChatCompletion, ChatProvider, HttpChatProvider, ProviderCall, TokenUsage};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use router::{Capability, CredentialStore, ProviderDescriptor, ProviderTable, ResolvedProvider};

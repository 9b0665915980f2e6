//! Configuration for the gateway

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Upstream provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Persona configuration
    #[serde(default)]
    pub persona: PersonaConfig,
    /// Quota configuration
    #[serde(default)]
    pub quota: QuotaConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid config file: {}", e)))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding dimensions
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters (grapheme clusters)
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 400 }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per turn
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Upstream provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Request timeout in seconds for upstream calls
    pub timeout_secs: u64,
    /// Default model when the caller does not name one
    pub default_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            default_model: "meta/llama-3.1-405b-instruct".to_string(),
        }
    }
}

/// Persona configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Assistant display name
    pub name: String,
    /// System prompt establishing the persona
    pub system_prompt: String,
    /// Maximum number of history turns kept in the prompt
    pub history_limit: usize,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Noddy".to_string(),
            system_prompt: DEFAULT_PERSONA.to_string(),
            history_limit: 10,
        }
    }
}

/// Quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Daily request limit per identity
    pub daily_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { daily_limit: 50 }
    }
}

/// Default persona prompt
pub const DEFAULT_PERSONA: &str = "\
You are Noddy, a modern, playful, wise, adult-cartoon-persona AI assistant.
Personality traits:
- Playful adult cartoon girl
- Cheerful but wise
- Flirty but respectful
- Answers with warmth and emotional intelligence
- Always stays in character unless performing a technical function

Your goal is to be helpful while maintaining this engaging personality.";

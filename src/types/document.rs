//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A document that has been ingested
///
/// Documents are identified by their source name and are immutable once
/// ingested; re-ingesting the same source name creates a new revision with
/// fresh chunk identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source name (e.g. a filename)
    pub source: String,
    /// SHA-256 of the document text, hex encoded
    pub content_hash: String,
    /// Number of chunks produced from this document
    pub chunk_count: usize,
    /// When this revision was ingested
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// Create a document record for a source and its extracted text
    pub fn new(source: impl Into<String>, text: &str, chunk_count: usize) -> Self {
        Self {
            source: source.into(),
            content_hash: content_hash(text),
            chunk_count,
            ingested_at: Utc::now(),
        }
    }

    /// Short revision tag derived from the content hash
    pub fn revision(&self) -> &str {
        &self.content_hash[..8]
    }
}

/// Compute a hex SHA-256 hash of document content
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// A bounded text segment of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier, derived from source name, sequence index, and
    /// revision tag: `"{source}#{seq}@{rev}"`
    pub id: String,
    /// Source name of the owning document
    pub source: String,
    /// Position of this chunk within the document
    pub seq: usize,
    /// Raw text span
    pub text: String,
}

impl Chunk {
    /// Create a chunk for a document revision
    pub fn new(source: &str, revision: &str, seq: usize, text: impl Into<String>) -> Self {
        Self {
            id: format!("{}#{}@{}", source, seq, revision),
            source: source.to_string(),
            seq,
            text: text.into(),
        }
    }
}

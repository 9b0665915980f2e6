//! Document ingestion: chunk, embed, and index

pub mod chunker;

pub use chunker::ChunkSplitter;

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::{IndexRecord, VectorIndex};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, Document};

/// Result of ingesting one document
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    /// Source name
    pub source: String,
    /// Number of chunks created
    pub chunks: usize,
    /// Content hash of this revision
    pub content_hash: String,
}

/// Ingestion pipeline over the shared index
///
/// Callers hand over already-extracted plain text; parsing binary formats
/// is an external collaborator's job. Embeddings are computed before the
/// index write lock is taken, so a document's chunks land atomically
/// without stalling concurrent queries.
pub struct IngestPipeline {
    splitter: ChunkSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    documents: DashMap<String, Document>,
}

impl IngestPipeline {
    /// Create a pipeline over an index and embedder
    pub fn new(
        splitter: ChunkSplitter,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            splitter,
            embedder,
            index,
            documents: DashMap::new(),
        }
    }

    /// Ingest a named document, replacing any prior revision of the same
    /// source
    pub async fn ingest(&self, name: &str, text: &str) -> Result<IngestReceipt> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::bad_request("document name must not be empty"));
        }
        if text.is_empty() {
            return Err(Error::bad_request("document text must not be empty"));
        }

        let windows: Vec<&str> = self.splitter.split(text).collect();
        let document = Document::new(name, text, windows.len());
        let revision = document.revision().to_string();

        tracing::info!(
            "Ingesting '{}' rev {} ({} chars, {} chunks)",
            name,
            revision,
            text.len(),
            windows.len()
        );

        let texts: Vec<String> = windows.iter().map(|w| w.to_string()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<IndexRecord> = windows
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(seq, (window, embedding))| IndexRecord {
                chunk: Chunk::new(name, &revision, seq, *window),
                embedding,
            })
            .collect();

        self.index.insert_batch(name, records)?;

        let receipt = IngestReceipt {
            source: document.source.clone(),
            chunks: document.chunk_count,
            content_hash: document.content_hash.clone(),
        };
        if let Some(previous) = self.documents.insert(name.to_string(), document) {
            tracing::info!(
                "Replaced prior revision {} of '{}'",
                previous.revision(),
                name
            );
        }

        Ok(receipt)
    }

    /// Snapshot of all ingested documents
    pub fn documents(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.documents.iter().map(|e| e.value().clone()).collect();
        docs.sort_by(|a, b| a.source.cmp(&b.source));
        docs
    }
}

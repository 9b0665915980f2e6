//! Similarity retrieval over the vector index

use std::sync::Arc;

use crate::index::VectorIndex;
use crate::providers::EmbeddingProvider;

/// Context retrieved for one query
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Matched chunk texts joined in ranked order; empty when nothing was
    /// retrieved
    pub context: String,
    /// Distinct source names of the matched chunks, first-seen order
    pub sources: Vec<String>,
    /// Number of matched fragments
    pub fragments: usize,
    /// Diagnostic note when retrieval was degraded or found nothing
    pub note: Option<String>,
}

impl RetrievedContext {
    /// An empty context with a diagnostic note
    pub fn empty(note: impl Into<String>) -> Self {
        Self {
            context: String::new(),
            sources: Vec::new(),
            fragments: 0,
            note: Some(note.into()),
        }
    }
}

/// Turns a user query into ranked context from the index
///
/// Degrades rather than fails: an empty index or a broken embedding call
/// yields an empty context with a note, and the conversation proceeds
/// without retrieved context.
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Create a retriever over an index and the ingestion-time embedder
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Retrieve the `top_k` nearest chunks for a query
    pub async fn retrieve(&self, query_text: &str, top_k: usize) -> RetrievedContext {
        if self.index.is_empty() {
            return RetrievedContext::empty("memory is empty, answering without context");
        }

        let embedding = match self.embedder.embed(query_text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Query embedding failed, degrading to empty context: {}", e);
                return RetrievedContext::empty(format!("memory lookup degraded: {}", e));
            }
        };

        let hits = match self.index.query(&embedding, top_k) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Index query failed, degrading to empty context: {}", e);
                return RetrievedContext::empty(format!("memory lookup degraded: {}", e));
            }
        };

        if hits.is_empty() {
            return RetrievedContext::empty("no memory fragments matched");
        }

        let mut context = String::new();
        let mut sources: Vec<String> = Vec::new();
        for (i, hit) in hits.iter().enumerate() {
            if i > 0 {
                context.push_str("\n\n");
            }
            context.push_str(&format!("[{}] {}\n{}", i + 1, hit.chunk.source, hit.chunk.text));
            if !sources.contains(&hit.chunk.source) {
                sources.push(hit.chunk.source.clone());
            }
        }

        RetrievedContext {
            context,
            sources,
            fragments: hits.len(),
            note: None,
        }
    }
}

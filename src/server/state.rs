//! Application state for the gateway server

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::index::{DistanceMetric, VectorIndex};
use crate::ingestion::{ChunkSplitter, IngestPipeline};
use crate::orchestrator::ConversationOrchestrator;
use crate::providers::{
    ChatProvider, CredentialStore, EmbeddingProvider, HashingEmbedder, HttpChatProvider,
    ProviderTable,
};
use crate::quota::QuotaLedger;
use crate::retrieval::Retriever;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    pipeline: IngestPipeline,
    orchestrator: ConversationOrchestrator,
    ledger: Arc<QuotaLedger>,
}

impl AppState {
    /// Create state with the HTTP dispatcher and env-backed credentials
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let chat = Arc::new(HttpChatProvider::new(&config.provider));
        Self::with_chat_provider(config, chat, CredentialStore::from_env())
    }

    /// Create state with an explicit dispatcher and credential store
    ///
    /// Used by tests to stub the upstream call.
    pub fn with_chat_provider(
        config: GatewayConfig,
        chat: Arc<dyn ChatProvider>,
        credentials: CredentialStore,
    ) -> Result<Self> {
        tracing::info!(
            "Initializing gateway state (dim {}, chunk {} chars, quota {}/day)",
            config.embeddings.dimensions,
            config.chunking.max_chars,
            config.quota.daily_limit
        );

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(HashingEmbedder::new(config.embeddings.dimensions));
        let index = Arc::new(VectorIndex::new(
            config.embeddings.dimensions,
            DistanceMetric::Cosine,
        ));
        let ledger = Arc::new(QuotaLedger::new(config.quota.daily_limit));

        let pipeline = IngestPipeline::new(
            ChunkSplitter::new(config.chunking.max_chars)?,
            Arc::clone(&embedder),
            Arc::clone(&index),
        );
        let retriever = Retriever::new(index, embedder);
        let orchestrator = ConversationOrchestrator::new(
            &config,
            retriever,
            ProviderTable::new(credentials),
            Arc::clone(&ledger),
            chat,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                orchestrator,
                ledger,
            }),
        })
    }

    /// Gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Ingestion pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Conversation orchestrator
    pub fn orchestrator(&self) -> &ConversationOrchestrator {
        &self.inner.orchestrator
    }

    /// Quota ledger
    pub fn ledger(&self) -> &QuotaLedger {
        &self.inner.ledger
    }
}

//! Conversation orchestration
//!
//! Runs one chat turn through admission, retrieval, prompt assembly,
//! provider dispatch, and usage recording, collecting a human-readable
//! trace along the way. The trace is purely observational and never feeds
//! back into control flow.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::generation::PromptAssembler;
use crate::providers::{ChatProvider, ProviderCall, ProviderTable};
use crate::quota::{Admission, QuotaLedger};
use crate::retrieval::Retriever;
use crate::types::ChatRequest;

/// Outcome of one orchestrated turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's answer, or the quota apology on denial
    pub response: String,
    /// Ordered step descriptions for the caller's thought log
    pub thoughts: Vec<String>,
}

/// Top-level coordinator for chat turns
pub struct ConversationOrchestrator {
    retriever: Retriever,
    assembler: PromptAssembler,
    providers: ProviderTable,
    ledger: Arc<QuotaLedger>,
    chat: Arc<dyn ChatProvider>,
    top_k: usize,
}

impl ConversationOrchestrator {
    /// Wire up the orchestrator from its collaborators
    pub fn new(
        config: &GatewayConfig,
        retriever: Retriever,
        providers: ProviderTable,
        ledger: Arc<QuotaLedger>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            retriever,
            assembler: PromptAssembler::new(&config.persona),
            providers,
            ledger,
            chat,
            top_k: config.retrieval.top_k,
        }
    }

    /// Handle one turn: ADMIT → RETRIEVE → ASSEMBLE → DISPATCH → RECORD
    ///
    /// A denied admission short-circuits with the apology message; only
    /// configuration and upstream errors terminate the turn as failures.
    pub async fn handle_turn(&self, request: &ChatRequest) -> Result<TurnOutcome> {
        if request.message.trim().is_empty() {
            return Err(Error::bad_request("message must not be empty"));
        }

        let mut thoughts = Vec::new();

        thoughts.push(format!("checking the daily quota for '{}'", request.quota_key));
        if let Admission::Denied { message } = self.ledger.admit(&request.quota_key) {
            thoughts.push("daily limit reached, answering with an apology".to_string());
            return Ok(TurnOutcome {
                response: message,
                thoughts,
            });
        }

        thoughts.push("searching memory for related fragments".to_string());
        let retrieved = self.retriever.retrieve(&request.message, self.top_k).await;
        if retrieved.fragments > 0 {
            thoughts.push(format!(
                "found {} relevant memory fragment(s) from {}",
                retrieved.fragments,
                retrieved.sources.join(", ")
            ));
        } else {
            thoughts.push("no memory fragments found".to_string());
            if let Some(note) = &retrieved.note {
                thoughts.push(note.clone());
            }
        }

        let messages = self
            .assembler
            .assemble(&retrieved.context, &request.history, &request.message);
        thoughts.push(format!(
            "assembled {} message(s) for the prompt",
            messages.len()
        ));

        let resolved = self.providers.resolve(&request.model)?;
        for warning in &resolved.warnings {
            thoughts.push(format!("warning: {}", warning));
        }
        thoughts.push(format!(
            "sending {} message(s) to {} (model {})",
            messages.len(),
            resolved.provider.name,
            request.model
        ));

        let call = ProviderCall {
            provider: resolved.provider,
            api_key: resolved.api_key,
            model: request.model.clone(),
            messages,
        };
        let completion = self.chat.complete(&call).await?;

        self.ledger.record(
            &request.quota_key,
            completion.usage.input_tokens,
            completion.usage.output_tokens,
        );
        thoughts.push(format!(
            "recorded {} input / {} output tokens{} for '{}'",
            completion.usage.input_tokens,
            completion.usage.output_tokens,
            if completion.usage.estimated {
                " (estimated)"
            } else {
                ""
            },
            request.quota_key
        ));

        tracing::info!(
            "Turn completed via {} for '{}'",
            resolved.provider.name,
            request.quota_key
        );

        Ok(TurnOutcome {
            response: completion.text,
            thoughts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::index::{DistanceMetric, VectorIndex};
    use crate::ingestion::{ChunkSplitter, IngestPipeline};
    use crate::providers::{ChatCompletion, CredentialStore, HashingEmbedder, TokenUsage};
    use crate::types::ConversationTurn;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Stub provider capturing each dispatched call
    struct StubChat {
        calls: Mutex<Vec<ProviderCall>>,
        fail_with: Option<(u16, String)>,
    }

    impl StubChat {
        fn answering() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
            })
        }

        fn failing(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some((status, body.to_string())),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn last_call_system_message(&self) -> String {
            self.calls.lock().last().unwrap().messages[0].content.clone()
        }
    }

    #[async_trait]
    impl ChatProvider for StubChat {
        async fn complete(&self, call: &ProviderCall) -> Result<ChatCompletion> {
            self.calls.lock().push(ProviderCall {
                provider: call.provider,
                api_key: call.api_key.clone(),
                model: call.model.clone(),
                messages: call.messages.clone(),
            });
            if let Some((status, body)) = &self.fail_with {
                return Err(Error::upstream(call.provider.name, *status, body.clone()));
            }
            Ok(ChatCompletion {
                text: "Here you go!".to_string(),
                usage: TokenUsage {
                    input_tokens: 42,
                    output_tokens: 7,
                    estimated: false,
                },
            })
        }
    }

    struct Harness {
        orchestrator: ConversationOrchestrator,
        pipeline: IngestPipeline,
        ledger: Arc<QuotaLedger>,
        chat: Arc<StubChat>,
    }

    fn harness_with(config: GatewayConfig, chat: Arc<StubChat>, vars: &[(&str, &str)]) -> Harness {
        let embedder = Arc::new(HashingEmbedder::new(config.embeddings.dimensions));
        let index = Arc::new(VectorIndex::new(
            config.embeddings.dimensions,
            DistanceMetric::Cosine,
        ));
        let pipeline = IngestPipeline::new(
            ChunkSplitter::new(config.chunking.max_chars).unwrap(),
            Arc::clone(&embedder) as Arc<dyn crate::providers::EmbeddingProvider>,
            Arc::clone(&index),
        );
        let ledger = Arc::new(QuotaLedger::new(config.quota.daily_limit));
        let retriever = Retriever::new(index, embedder);
        let providers = ProviderTable::new(CredentialStore::with_vars(
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        ));
        let orchestrator = ConversationOrchestrator::new(
            &config,
            retriever,
            providers,
            Arc::clone(&ledger),
            Arc::clone(&chat) as Arc<dyn ChatProvider>,
        );
        Harness {
            orchestrator,
            pipeline,
            ledger,
            chat,
        }
    }

    fn harness(chat: Arc<StubChat>) -> Harness {
        harness_with(
            GatewayConfig::default(),
            chat,
            &[("NVIDIA_API_KEY", "nv-key"), ("OPENROUTER_API_KEY", "or-key")],
        )
    }

    #[tokio::test]
    async fn ingested_fact_reaches_the_prompt_and_the_trace() {
        let h = harness(StubChat::answering());
        h.pipeline
            .ingest("quota.txt", "The quota resets every day at midnight UTC.")
            .await
            .unwrap();

        let outcome = h
            .orchestrator
            .handle_turn(&ChatRequest::new("When does the quota reset?"))
            .await
            .unwrap();

        assert_eq!(outcome.response, "Here you go!");
        assert!(outcome
            .thoughts
            .iter()
            .any(|t| t.contains("found 1 relevant")));
        assert!(h
            .chat
            .last_call_system_message()
            .contains("The quota resets every day at midnight UTC."));
    }

    #[tokio::test]
    async fn empty_memory_still_produces_an_answer() {
        let h = harness(StubChat::answering());

        let outcome = h
            .orchestrator
            .handle_turn(&ChatRequest::new("Tell me something"))
            .await
            .unwrap();

        assert_eq!(outcome.response, "Here you go!");
        assert!(outcome
            .thoughts
            .iter()
            .any(|t| t.contains("no memory fragments found")));
        // No context block when nothing was retrieved
        assert!(!h
            .chat
            .last_call_system_message()
            .contains("Use the following context"));
    }

    #[tokio::test]
    async fn denied_turns_never_reach_the_provider() {
        let mut config = GatewayConfig::default();
        config.quota.daily_limit = 1;
        let chat = StubChat::answering();
        let h = harness_with(
            config,
            Arc::clone(&chat),
            &[("NVIDIA_API_KEY", "nv-key"), ("OPENROUTER_API_KEY", "or-key")],
        );

        let first = h
            .orchestrator
            .handle_turn(&ChatRequest::new("hello"))
            .await
            .unwrap();
        assert_eq!(first.response, "Here you go!");

        let second = h
            .orchestrator
            .handle_turn(&ChatRequest::new("hello again"))
            .await
            .unwrap();
        assert!(second.response.contains("midnight UTC"));
        assert!(second
            .thoughts
            .iter()
            .any(|t| t.contains("daily limit reached")));
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn primary_credential_absent_falls_back_with_trace_warning() {
        let h = harness_with(
            GatewayConfig::default(),
            StubChat::answering(),
            &[("OPENROUTER_API_KEY", "or-key")],
        );

        let outcome = h
            .orchestrator
            .handle_turn(&ChatRequest::new("hello").with_model("meta/llama-3.1-405b-instruct"))
            .await
            .unwrap();

        assert!(outcome
            .thoughts
            .iter()
            .any(|t| t.contains("warning") && t.contains("falling back")));
        assert!(outcome
            .thoughts
            .iter()
            .any(|t| t.contains("sending") && t.contains("openrouter")));
    }

    #[tokio::test]
    async fn upstream_failure_propagates_and_is_not_recorded() {
        let chat = StubChat::failing(500, "boom");
        let h = harness(Arc::clone(&chat));

        let err = h
            .orchestrator
            .handle_turn(&ChatRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 500, .. }));
        assert!(h.ledger.usage("global").map_or(true, |u| u.requests == 0));
    }

    #[tokio::test]
    async fn missing_all_credentials_is_a_configuration_error() {
        let h = harness_with(GatewayConfig::default(), StubChat::answering(), &[]);

        let err = h
            .orchestrator
            .handle_turn(&ChatRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn successful_turns_record_usage_once() {
        let h = harness(StubChat::answering());

        h.orchestrator
            .handle_turn(&ChatRequest::new("hello").with_quota_key("alice"))
            .await
            .unwrap();

        let usage = h.ledger.usage("alice").unwrap();
        assert_eq!(usage.requests, 1);
        assert_eq!(usage.input_tokens, 42);
        assert_eq!(usage.output_tokens, 7);
    }

    #[tokio::test]
    async fn history_is_forwarded_in_order() {
        let h = harness(StubChat::answering());
        let request = ChatRequest::new("third").with_history(vec![
            ConversationTurn::new("user", "first"),
            ConversationTurn::new("assistant", "second"),
        ]);

        h.orchestrator.handle_turn(&request).await.unwrap();

        let calls = h.chat.calls.lock();
        let messages = &calls.last().unwrap().messages;
        assert_eq!(messages[1].content, "first");
        assert_eq!(messages[2].content, "second");
        assert_eq!(messages[3].content, "third");
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let h = harness(StubChat::answering());
        let err = h
            .orchestrator
            .handle_turn(&ChatRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}

//! Upstream chat dispatch

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::generation::OutboundMessage;
use crate::providers::router::ProviderDescriptor;

/// A fully resolved upstream call
#[derive(Debug)]
pub struct ProviderCall {
    pub provider: &'static ProviderDescriptor,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<OutboundMessage>,
}

/// Token usage for one completed call
#[derive(Debug, Clone, Copy)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// True when the provider reported no usage block and the counts are
    /// a characters/4 estimate
    pub estimated: bool,
}

/// A successful upstream completion
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Trait for dispatching an assembled message list upstream
///
/// One synchronous call per turn, bounded by the client timeout. Retries
/// are caller policy, never performed here.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Perform the call and return the answer text with token usage
    async fn complete(&self, call: &ProviderCall) -> Result<ChatCompletion>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [OutboundMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// HTTP dispatcher speaking the OpenAI-compatible chat completions wire
/// format used by both configured providers
pub struct HttpChatProvider {
    client: Client,
}

impl HttpChatProvider {
    /// Create a dispatcher with the configured request timeout
    pub fn new(config: &ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    fn estimate_tokens(text: &str) -> u64 {
        // Rough 4-chars-per-token heuristic when the provider reports nothing
        (text.chars().count() as u64).div_ceil(4)
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete(&self, call: &ProviderCall) -> Result<ChatCompletion> {
        let request = CompletionRequest {
            model: &call.model,
            messages: &call.messages,
        };

        let mut builder = self
            .client
            .post(call.provider.endpoint)
            .bearer_auth(&call.api_key)
            .json(&request);
        for (name, value) in call.provider.extra_headers {
            builder = builder.header(*name, *value);
        }

        tracing::info!(
            "Dispatching {} messages to {} (model {})",
            call.messages.len(),
            call.provider.name,
            call.model
        );

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(call.provider.name, status.as_u16(), body));
        }

        let payload: CompletionResponse = response.json().await.map_err(|e| {
            Error::upstream(
                call.provider.name,
                status.as_u16(),
                format!("malformed payload: {}", e),
            )
        })?;

        let text = payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                Error::upstream(
                    call.provider.name,
                    status.as_u16(),
                    "response carried no choices",
                )
            })?;

        let usage = match payload.usage {
            Some(usage) => TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                estimated: false,
            },
            None => TokenUsage {
                input_tokens: call
                    .messages
                    .iter()
                    .map(|m| Self::estimate_tokens(&m.content))
                    .sum(),
                output_tokens: Self::estimate_tokens(&text),
                estimated: true,
            },
        };

        Ok(ChatCompletion { text, usage })
    }
}

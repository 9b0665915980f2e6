//! HTTP server for the gateway

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Gateway HTTP server
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a server from configuration
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create a server around pre-built state (used by tests)
    pub fn with_state(config: GatewayConfig, state: AppState) -> Self {
        Self { config, state }
    }

    fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_check))
            .nest("/api", routes::api_routes())
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::config(format!("invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting gateway on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::config(format!("failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("server error: {}", e)))?;

        Ok(())
    }

    /// The address the server will bind to
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as GatewayResult;
    use crate::providers::{
        ChatCompletion, ChatProvider, CredentialStore, ProviderCall, TokenUsage,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoChat;

    #[async_trait]
    impl ChatProvider for EchoChat {
        async fn complete(&self, _call: &ProviderCall) -> GatewayResult<ChatCompletion> {
            Ok(ChatCompletion {
                text: "echo".to_string(),
                usage: TokenUsage {
                    input_tokens: 1,
                    output_tokens: 1,
                    estimated: true,
                },
            })
        }
    }

    fn test_server() -> GatewayServer {
        let config = GatewayConfig::default();
        let state = AppState::with_chat_provider(
            config.clone(),
            Arc::new(EchoChat),
            CredentialStore::with_vars([
                ("NVIDIA_API_KEY", "nv-key"),
                ("OPENROUTER_API_KEY", "or-key"),
            ]),
        )
        .unwrap();
        GatewayServer::with_state(config, state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let router = test_server().build_router();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ingest_then_chat_round_trip() {
        let router = test_server().build_router();

        let response = router
            .clone()
            .oneshot(post_json(
                "/api/ingest",
                r#"{"name": "quota.txt", "text": "The quota resets every day at midnight UTC."}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = body_json(response).await;
        assert_eq!(receipt["chunks"], 1);
        assert_eq!(receipt["source"], "quota.txt");

        let response = router
            .oneshot(post_json(
                "/api/chat",
                r#"{"message": "When does the quota reset?"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "echo");
        let thoughts = body["thoughts"].as_array().unwrap();
        assert!(thoughts
            .iter()
            .any(|t| t.as_str().unwrap().contains("found 1 relevant")));
    }

    #[tokio::test]
    async fn empty_ingest_is_a_client_error() {
        let router = test_server().build_router();
        let response = router
            .oneshot(post_json("/api/ingest", r#"{"name": "a.txt", "text": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_chat_message_is_a_client_error() {
        let router = test_server().build_router();
        let response = router
            .oneshot(post_json("/api/chat", r#"{"message": "  "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_credentials_map_to_service_unavailable() {
        let config = GatewayConfig::default();
        let state = AppState::with_chat_provider(
            config.clone(),
            Arc::new(EchoChat),
            CredentialStore::with_vars(Vec::<(String, String)>::new()),
        )
        .unwrap();
        let router = GatewayServer::with_state(config, state).build_router();

        let response = router
            .oneshot(post_json("/api/chat", r#"{"message": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        // Generic message only; credential details stay in the log
        assert_eq!(body["error"]["message"], "service unavailable");
    }

    #[tokio::test]
    async fn usage_endpoint_reports_counters() {
        let router = test_server().build_router();

        router
            .clone()
            .oneshot(post_json(
                "/api/chat",
                r#"{"message": "hello", "quota_key": "alice"}"#,
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/usage/alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["usage"]["requests"], 1);
    }

    #[tokio::test]
    async fn documents_endpoint_lists_ingested_sources() {
        let router = test_server().build_router();

        router
            .clone()
            .oneshot(post_json(
                "/api/ingest",
                r#"{"name": "notes.txt", "text": "some notes"}"#,
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/documents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body[0]["source"], "notes.txt");
    }
}

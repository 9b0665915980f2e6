//! API routes for the gateway server

pub mod chat;
pub mod ingest;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat_turn))
        .route("/ingest", post(ingest::ingest_document))
        .route("/documents", get(ingest::list_documents))
        .route("/usage/:identity", get(usage))
        .route("/info", get(info))
}

/// GET /api/usage/:identity - quota counters for one identity
async fn usage(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Json<serde_json::Value> {
    let usage = state.ledger().usage(&identity);
    Json(json!({
        "identity": identity,
        "daily_limit": state.ledger().daily_limit(),
        "usage": usage,
    }))
}

/// GET /api/info - API info endpoint
async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "noddy-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Conversational assistant gateway with retrieval-augmented generation",
        "endpoints": {
            "POST /api/chat": "Run one chat turn with retrieval and quota accounting",
            "POST /api/ingest": "Ingest a document as extracted plain text",
            "GET /api/documents": "List ingested documents",
            "GET /api/usage/:identity": "Quota counters for an identity",
        },
    }))
}

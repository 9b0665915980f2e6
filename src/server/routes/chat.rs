//! Chat endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /api/chat - run one conversational turn
pub async fn chat_turn(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    tracing::info!(
        "Chat turn: \"{}\" (model {}, {} history turns)",
        request.message,
        request.model,
        request.history.len()
    );

    let outcome = state.orchestrator().handle_turn(&request).await?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        thoughts: outcome.thoughts,
    }))
}

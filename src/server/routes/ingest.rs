//! Document ingestion endpoint

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::Result;
use crate::ingestion::IngestReceipt;
use crate::server::state::AppState;
use crate::types::Document;

/// Ingestion request: a named document as extracted plain text
///
/// Extraction from binary formats (PDF etc.) happens outside the gateway.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// Source name, e.g. a filename
    pub name: String,
    /// Extracted plain text
    pub text: String,
}

/// POST /api/ingest - chunk, embed, and index a document
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestReceipt>> {
    let receipt = state.pipeline().ingest(&request.name, &request.text).await?;
    Ok(Json(receipt))
}

/// GET /api/documents - list ingested documents
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.pipeline().documents())
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::require_user;
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "documentId")]
    pub document_id: String,
    pub question: String,
    #[serde(default, alias = "deepSearch")]
    pub deep_search: bool,
}

/// `POST /api/chat`: answer a question against one ingested document.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;

    let answer = state
        .answering
        .answer(
            &user.id,
            &payload.document_id,
            &payload.question,
            payload.deep_search,
        )
        .await?;

    Ok(Json(json!({ "answer": answer })))
}

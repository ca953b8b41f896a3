use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::require_user;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;
    let documents = state.documents.list_documents(&user.id).await?;

    let result: Vec<Value> = documents
        .into_iter()
        .map(|doc| {
            json!({
                "id": doc.id,
                "name": doc.name,
                "created_at": doc.created_at,
                "url": doc.storage_ref,
            })
        })
        .collect();

    Ok(Json(json!({ "documents": result })))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;

    // Ownership check first; chunks and turns go with the document.
    let document = state
        .documents
        .get_owned_document(&user.id, &document_id)
        .await?;
    state.documents.delete_document(&document.id).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn get_document_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;

    let document = state
        .documents
        .get_owned_document(&user.id, &document_id)
        .await?;
    let turns = state.conversations.get_history(&document.id, 200).await?;

    let messages: Vec<Value> = turns
        .into_iter()
        .map(|turn| {
            json!({
                "role": turn.role,
                "content": turn.content,
                "created_at": turn.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "messages": messages })))
}

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::auth::require_user;
use crate::errors::ApiError;
use crate::state::AppState;

/// `POST /api/ingest`: multipart upload with a single `file` field.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;

    let mut file_name = None;
    let mut bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("Invalid multipart payload: {}", err)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|name| name.to_string());
            bytes = Some(field.bytes().await.map_err(|err| {
                ApiError::BadRequest(format!("Failed to read uploaded file: {}", err))
            })?);
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("A file is required".to_string()))?;
    let file_name = file_name.unwrap_or_else(|| "upload.pdf".to_string());

    let document_id = state.ingestion.ingest(&user.id, &bytes, &file_name).await?;

    Ok(Json(json!({ "success": true, "document_id": document_id })))
}

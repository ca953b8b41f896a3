use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::require_admin;
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.users).await?;
    let users = state.users.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

/// Approval workflow: flip a user's status and/or role.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.users).await?;

    let found = state
        .users
        .update_user(
            &payload.id,
            payload.status.as_deref(),
            payload.role.as_deref(),
        )
        .await?;
    if !found {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &state.users).await?;

    let (total, active, pending) = state.users.user_stats().await?;
    let users = state.users.list_users().await?;

    Ok(Json(json!({
        "stats": { "total": total, "active": active, "pending": pending },
        "users": users,
    })))
}

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{admin, auth, chat, documents, health, ingest, summarize};
use crate::state::AppState;

/// Upload ceiling for multipart ingestion requests.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Creates the main application router with all routes and middleware.
///
/// This function sets up:
/// - CORS middleware
/// - The per-request wall-clock timeout
/// - Auth, ingestion, chat, library, and admin endpoints
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/ingest", post(ingest::ingest))
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/documents",
            get(documents::list_documents),
        )
        .route(
            "/api/documents/:document_id",
            delete(documents::delete_document),
        )
        .route(
            "/api/documents/:document_id/messages",
            get(documents::get_document_messages),
        )
        .route("/api/summarize", post(summarize::summarize))
        .route("/api/library", get(summarize::list_library))
        .route("/api/library/:summary_id", delete(summarize::delete_library_entry))
        .route("/api/admin/users", get(admin::list_users).patch(admin::update_user))
        .route("/api/admin/stats", get(admin::stats))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let configured = &state.config.server.cors_allowed_origins;

    let origins: Vec<HeaderValue> = if configured.is_empty() {
        default_local_origins()
            .into_iter()
            .filter_map(|origin| HeaderValue::from_str(&origin).ok())
            .collect()
    } else {
        configured
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

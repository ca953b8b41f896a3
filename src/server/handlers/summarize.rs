use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::require_user;
use crate::errors::ApiError;
use crate::llm::provider::CompletionRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_kind", alias = "type")]
    pub kind: String,
    #[serde(default = "default_output_option", alias = "outputOption")]
    pub output_option: String,
}

fn default_kind() -> String {
    "text".to_string()
}

fn default_output_option() -> String {
    "summary".to_string()
}

fn prompt_prefix(output_option: &str) -> &'static str {
    match output_option {
        "questions" => "Generate 3 exam-focused questions with answers based on the following content:",
        "mcq" => "Generate 3 multiple-choice questions (MCQs) with the correct answer indicated based on the following content:",
        "detailed" => "Generate a detailed study note with introduction, core analysis, implications, and conclusion based on the following content:",
        _ => "Generate a concise summary with key takeaways based on the following content:",
    }
}

/// `POST /api/summarize`: generate study material from pasted text or a
/// video URL and save it to the caller's library.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;

    let content = match (&payload.text, &payload.url) {
        (Some(text), _) if !text.trim().is_empty() => text.clone(),
        (_, Some(url)) if !url.trim().is_empty() => format!("Video URL: {}", url),
        _ => return Err(ApiError::BadRequest("Content is required".to_string())),
    };

    let request = CompletionRequest {
        question: content.clone(),
        context: String::new(),
        system_instruction: prompt_prefix(&payload.output_option).to_string(),
    };
    let generated = state.completions.complete(&request).await?;

    let title = if payload.kind == "video" {
        "Video Summary"
    } else {
        "Text Summary"
    };

    // Log-and-continue: the content is already generated.
    if let Err(err) = state
        .summaries
        .create_summary(&user.id, &payload.kind, title, &generated, &content)
        .await
    {
        tracing::warn!("failed to save summary for user {}: {}", user.id, err);
    }

    Ok(Json(json!({ "content": generated })))
}

pub async fn list_library(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;
    let summaries = state.summaries.list_summaries(&user.id).await?;
    Ok(Json(json!({ "summaries": summaries })))
}

pub async fn delete_library_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(summary_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state.users).await?;
    state.summaries.delete_summary(&user.id, &summary_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_prefix_covers_every_output_option() {
        assert!(prompt_prefix("questions").contains("exam-focused questions"));
        assert!(prompt_prefix("mcq").contains("multiple-choice"));
        assert!(prompt_prefix("detailed").contains("detailed study note"));
        assert!(prompt_prefix("summary").contains("concise summary"));
        // Unknown options fall back to the summary prompt.
        assert!(prompt_prefix("whatever").contains("concise summary"));
    }
}

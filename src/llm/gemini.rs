//! Google Generative Language API adapter.
//!
//! Serves two roles: the embedding backend (`text-embedding-004`,
//! `:embedContent`) and the secondary completion backend
//! (`:generateContent`).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{CompletionBackend, CompletionRequest, EmbeddingBackend};
use crate::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    completion_model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: String, embedding_model: String, completion_model: String) -> Self {
        Self::with_base_url(
            DEFAULT_BASE_URL.to_string(),
            api_key,
            embedding_model,
            completion_model,
        )
    }

    pub fn with_base_url(
        base_url: String,
        api_key: String,
        embedding_model: String,
        completion_model: String,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model,
            completion_model,
            client: Client::new(),
        }
    }

    async fn post(&self, model: &str, action: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, action, self.api_key
        );

        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini {} error ({}): {}",
                action, status, text
            )));
        }

        res.json().await.map_err(ApiError::internal)
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let body = json!({
            "model": format!("models/{}", self.embedding_model),
            "content": { "parts": [{ "text": text }] },
        });

        let payload = self.post(&self.embedding_model, "embedContent", &body).await?;

        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| ApiError::Internal("Gemini embedding response missing values".into()))?;

        Ok(values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ApiError> {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.user_content() }],
            }],
        });

        if !request.system_instruction.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{ "text": request.system_instruction }],
            });
        }

        let payload = self
            .post(&self.completion_model, "generateContent", &body)
            .await?;

        let answer = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if answer.is_empty() {
            return Err(ApiError::Internal(
                "Gemini returned no completion candidates".into(),
            ));
        }

        Ok(answer)
    }
}

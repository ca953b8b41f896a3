//! Groq chat adapter (OpenAI-compatible API). Primary completion backend.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{CompletionBackend, CompletionRequest};
use crate::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";

#[derive(Clone)]
pub struct GroqClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GroqClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key, model)
    }

    pub fn with_base_url(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CompletionBackend for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_content() },
            ],
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Groq chat error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let answer = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if answer.is_empty() {
            return Err(ApiError::Internal("Groq returned an empty completion".into()));
        }

        Ok(answer)
    }
}

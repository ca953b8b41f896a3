use async_trait::async_trait;

use crate::errors::ApiError;

/// One prompt for a completion backend. `context` may be empty (the
/// summarize flow sends bare content); backends fold a non-empty context
/// and the question into a single user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub question: String,
    pub context: String,
    pub system_instruction: String,
}

impl CompletionRequest {
    pub fn user_content(&self) -> String {
        if self.context.is_empty() {
            self.question.clone()
        } else {
            format!("Context: {}\n\nQuestion: {}", self.context, self.question)
        }
    }
}

#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    /// text → fixed-length vector. Network/auth/quota failures surface as
    /// errors here; the degradation policy lives in the calling service.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// (question, context, instructions) → answer text. One attempt, no
    /// internal retry; the chain is the failover mechanism.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_content_folds_context_and_question() {
        let request = CompletionRequest {
            question: "What is ownership?".to_string(),
            context: "Ownership is Rust's memory model.".to_string(),
            system_instruction: "Answer concisely.".to_string(),
        };
        assert_eq!(
            request.user_content(),
            "Context: Ownership is Rust's memory model.\n\nQuestion: What is ownership?"
        );
    }

    #[test]
    fn user_content_without_context_is_the_bare_question() {
        let request = CompletionRequest {
            question: "Summarize this.".to_string(),
            context: String::new(),
            system_instruction: String::new(),
        };
        assert_eq!(request.user_content(), "Summarize this.");
    }
}

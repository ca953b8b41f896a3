//! Retrieval and answering pipeline.
//!
//! Embeds the question, ranks the document's chunks by cosine distance,
//! assembles the context, and asks the completion chain. The conversation
//! exchange is persisted after an answer exists; a persistence failure there
//! is logged and swallowed because the answer is already computed. Provider
//! exhaustion is the only fatal outcome and persists nothing.

use crate::config::RetrievalConfig;
use crate::errors::ApiError;
use crate::history::ConversationStore;
use crate::llm::chain::CompletionChain;
use crate::llm::embedder::EmbeddingService;
use crate::llm::provider::CompletionRequest;

use super::store::DocumentStore;

/// Terminal answer for documents with no retrievable chunks. Not an error.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant information in that file.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const SHALLOW_INSTRUCTION: &str = "You are a helpful assistant. Answer concisely based on the \
     context. If the answer is not in the context, say you don't know.";

const DEEP_INSTRUCTION: &str = "You are an expert analyst. Provide a detailed, comprehensive \
     answer based STRICTLY on the context. Explain your reasoning and cite specific details.";

#[derive(Clone)]
pub struct AnswerPipeline {
    documents: DocumentStore,
    conversations: ConversationStore,
    embedder: EmbeddingService,
    chain: CompletionChain,
    retrieval: RetrievalConfig,
}

impl AnswerPipeline {
    pub fn new(
        documents: DocumentStore,
        conversations: ConversationStore,
        embedder: EmbeddingService,
        chain: CompletionChain,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            documents,
            conversations,
            embedder,
            chain,
            retrieval,
        }
    }

    pub async fn answer(
        &self,
        owner_id: &str,
        document_id: &str,
        question: &str,
        deep_search: bool,
    ) -> Result<String, ApiError> {
        let question = question.trim();
        if question.is_empty() || document_id.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Question and document id are required".to_string(),
            ));
        }

        // Absent and foreign documents look identical to the caller.
        let document = self
            .documents
            .get_owned_document(owner_id, document_id)
            .await?;

        let query_vector = self.embedder.embed(question).await;

        let limit = if deep_search {
            self.retrieval.top_k_deep
        } else {
            self.retrieval.top_k
        };
        let hits = self
            .documents
            .search_chunks(&document.id, &query_vector, limit)
            .await?;

        if hits.is_empty() {
            let answer = NO_CONTEXT_ANSWER.to_string();
            self.record_exchange(&document.id, owner_id, question, &answer)
                .await;
            return Ok(answer);
        }

        let context = hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let request = CompletionRequest {
            question: question.to_string(),
            context,
            system_instruction: if deep_search {
                DEEP_INSTRUCTION.to_string()
            } else {
                SHALLOW_INSTRUCTION.to_string()
            },
        };

        let answer = self.chain.complete(&request).await?;

        self.record_exchange(&document.id, owner_id, question, &answer)
            .await;

        Ok(answer)
    }

    /// Log-and-continue: the answer is already computed, so a failure to
    /// persist the turns must not fail the request.
    async fn record_exchange(&self, document_id: &str, user_id: &str, question: &str, answer: &str) {
        if let Err(err) = self
            .conversations
            .append_exchange(document_id, user_id, question, answer)
            .await
        {
            tracing::warn!(
                "failed to persist conversation turns for document {}: {}",
                document_id,
                err
            );
        }
    }
}

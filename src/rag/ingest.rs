//! Document ingestion pipeline.
//!
//! extract → create document → chunk → embed and persist each chunk in
//! order. Chunks are written incrementally, not batched: chunk `i` is
//! durable before chunk `i+1` is embedded, and a failure mid-run leaves the
//! document with the chunks persisted so far rather than rolling back. No
//! step retries; the first unrecoverable error propagates to the caller.

use crate::config::ChunkingConfig;
use crate::errors::ApiError;
use crate::extract;
use crate::llm::embedder::EmbeddingService;

use super::chunker::chunk_text;
use super::store::DocumentStore;

#[derive(Clone)]
pub struct IngestionPipeline {
    documents: DocumentStore,
    embedder: EmbeddingService,
    chunking: ChunkingConfig,
}

impl IngestionPipeline {
    pub fn new(
        documents: DocumentStore,
        embedder: EmbeddingService,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            documents,
            embedder,
            chunking,
        }
    }

    /// Returns the new document id. When extraction fails no document
    /// record exists afterwards.
    pub async fn ingest(
        &self,
        owner_id: &str,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<String, ApiError> {
        let text = extract::extract_text(bytes, file_name)?;

        let document_id = self
            .documents
            .create_document(owner_id, file_name, "internal")
            .await?;

        let chunks = chunk_text(&text, &self.chunking);
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(chunk).await;
            self.documents
                .insert_chunk(&document_id, index as i64, chunk, &embedding)
                .await?;
        }

        tracing::info!(
            "ingested '{}' as document {} ({} chunks)",
            file_name,
            document_id,
            total
        );

        Ok(document_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::db;
    use crate::llm::provider::EmbeddingBackend;

    struct CountingBackend;

    #[async_trait]
    impl EmbeddingBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
            // Deterministic stand-in: vector derived from the text length.
            let len = text.chars().count() as f32;
            Ok(vec![len, 1.0, 0.0])
        }
    }

    async fn test_pipeline(chunking: ChunkingConfig) -> (IngestionPipeline, DocumentStore) {
        let path = std::env::temp_dir().join(format!("paperbase-ingest-{}.db", Uuid::new_v4()));
        let pool = db::connect(&path).await.unwrap();
        let documents = DocumentStore::new(pool, 3).await.unwrap();
        let embedder = EmbeddingService::new(Arc::new(CountingBackend), 3);
        (
            IngestionPipeline::new(documents.clone(), embedder, chunking),
            documents,
        )
    }

    #[tokio::test]
    async fn ingest_creates_document_and_expected_chunk_count() {
        let chunking = ChunkingConfig {
            chunk_size: 50,
            chunk_overlap: 10,
        };
        let (pipeline, documents) = test_pipeline(chunking).await;

        let text = "The borrow checker enforces aliasing rules at compile time. ".repeat(5);
        let document_id = pipeline
            .ingest("u1", text.as_bytes(), "notes.txt")
            .await
            .unwrap();

        let stride = chunking.chunk_size - chunking.chunk_overlap;
        let expected = text.chars().count().div_ceil(stride) as i64;
        assert_eq!(documents.chunk_count(&document_id).await.unwrap(), expected);

        let docs = documents.list_documents("u1").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "notes.txt");
    }

    #[tokio::test]
    async fn failed_extraction_leaves_no_document_behind() {
        let (pipeline, documents) = test_pipeline(ChunkingConfig::default()).await;

        let err = pipeline.ingest("u1", b"", "empty.txt").await.unwrap_err();
        assert!(matches!(err, ApiError::ExtractionFailed(_)));
        assert!(documents.list_documents("u1").await.unwrap().is_empty());

        let err = pipeline
            .ingest("u1", b"GIF89a...", "image.gif")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ExtractionFailed(_)));
        assert!(documents.list_documents("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_document_produces_a_single_chunk() {
        let (pipeline, documents) = test_pipeline(ChunkingConfig::default()).await;

        let document_id = pipeline
            .ingest("u1", b"A single small note about lifetimes.", "note.txt")
            .await
            .unwrap();

        assert_eq!(documents.chunk_count(&document_id).await.unwrap(), 1);
    }
}

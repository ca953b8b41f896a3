//! SQLite-backed document and chunk store.
//!
//! Documents own their chunks (FK cascade). Chunk embeddings are stored as
//! little-endian f32 BLOBs and similarity search is a brute-force cosine
//! scan over one document's chunks, ranked by ascending distance with ties
//! broken by chunk creation order.

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub storage_ref: String,
    pub created_at: String,
}

/// One retrieval result: chunk text plus its cosine distance to the query.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub chunk_index: i64,
    pub content: String,
    pub distance: f32,
}

#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    dimension: usize,
}

impl DocumentStore {
    pub async fn new(pool: SqlitePool, dimension: usize) -> Result<Self, ApiError> {
        let store = Self { pool, dimension };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                storage_ref TEXT NOT NULL DEFAULT 'internal',
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_user ON documents(user_id)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id, chunk_index)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn create_document(
        &self,
        user_id: &str,
        name: &str,
        storage_ref: &str,
    ) -> Result<String, ApiError> {
        let document_id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO documents (id, user_id, name, storage_ref) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&document_id)
        .bind(user_id)
        .bind(name)
        .bind(storage_ref)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(document_id)
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Option<Document>, ApiError> {
        let row = sqlx::query(
            "SELECT id, user_id, name, storage_ref, created_at FROM documents WHERE id = ?1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(document_from_row))
    }

    /// Resolves a document only when it exists and belongs to `user_id`;
    /// absent and foreign documents are indistinguishable to the caller.
    pub async fn get_owned_document(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Document, ApiError> {
        match self.get_document(document_id).await? {
            Some(document) if document.user_id == user_id => Ok(document),
            _ => Err(ApiError::NotFound("Document not found".to_string())),
        }
    }

    pub async fn list_documents(&self, user_id: &str) -> Result<Vec<Document>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, storage_ref, created_at
             FROM documents
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    /// Cascades to chunks and conversation turns via foreign keys.
    pub async fn delete_document(&self, document_id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_chunk(
        &self,
        document_id: &str,
        chunk_index: i64,
        content: &str,
        embedding: &[f32],
    ) -> Result<String, ApiError> {
        if embedding.len() != self.dimension {
            return Err(ApiError::Internal(format!(
                "chunk embedding has {} dimensions, store expects {}",
                embedding.len(),
                self.dimension
            )));
        }

        let chunk_id = Uuid::new_v4().to_string();
        let blob = serialize_embedding(embedding);

        sqlx::query(
            "INSERT INTO chunks (id, document_id, chunk_index, content, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&chunk_id)
        .bind(document_id)
        .bind(chunk_index)
        .bind(content)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(chunk_id)
    }

    pub async fn chunk_count(&self, document_id: &str) -> Result<i64, ApiError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chunks WHERE document_id = ?1")
            .bind(document_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    /// Top-`limit` chunks of one document by ascending cosine distance to
    /// the query vector. Ties fall back to chunk creation order, so the
    /// ranking is a total order and repeat queries are deterministic.
    pub async fn search_chunks(
        &self,
        document_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkHit>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_index, content, embedding
             FROM chunks
             WHERE document_id = ?1
             ORDER BY chunk_index ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut hits: Vec<ChunkHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let stored = deserialize_embedding(&blob);
                ChunkHit {
                    chunk_index: row.get("chunk_index"),
                    content: row.get("content"),
                    distance: cosine_distance(query, &stored),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        hits.truncate(limit.max(1));

        Ok(hits)
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        storage_ref: row.get("storage_ref"),
        created_at: row.get("created_at"),
    }
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// 1 − cosine similarity; 0 = identical direction, larger = less similar.
/// Degenerate vectors (zero magnitude, length mismatch) rank last.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        1.0
    } else {
        1.0 - dot / denom
    }
}

//! Saved summaries ("library").
//!
//! Generated study material is persisted per user on a log-and-continue
//! basis: a storage failure never fails the summarize request that produced
//! the content.

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::ApiError;

/// Stored prefix of the source material, for display in listings.
const ORIGINAL_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub content: String,
    pub original: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct SummaryStore {
    pool: SqlitePool,
}

impl SummaryStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, ApiError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS summaries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                original TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_summaries_user ON summaries(user_id)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn create_summary(
        &self,
        user_id: &str,
        kind: &str,
        title: &str,
        content: &str,
        original: &str,
    ) -> Result<String, ApiError> {
        let summary_id = Uuid::new_v4().to_string();
        let excerpt: String = original.chars().take(ORIGINAL_EXCERPT_CHARS).collect();

        sqlx::query(
            "INSERT INTO summaries (id, user_id, kind, title, content, original)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&summary_id)
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(content)
        .bind(&excerpt)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(summary_id)
    }

    pub async fn list_summaries(&self, user_id: &str) -> Result<Vec<Summary>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, user_id, kind, title, content, original, created_at
             FROM summaries
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(summary_from_row).collect())
    }

    /// Deletes only when the summary exists and belongs to `user_id`.
    pub async fn delete_summary(&self, user_id: &str, summary_id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM summaries WHERE id = ?1 AND user_id = ?2")
            .bind(summary_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Summary not found".to_string()));
        }
        Ok(())
    }
}

fn summary_from_row(row: &sqlx::sqlite::SqliteRow) -> Summary {
    Summary {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: row.get("kind"),
        title: row.get("title"),
        content: row.get("content"),
        original: row.get("original"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_store() -> SummaryStore {
        let path = std::env::temp_dir().join(format!("paperbase-library-{}.db", Uuid::new_v4()));
        let pool = db::connect(&path).await.unwrap();
        SummaryStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn summaries_are_listed_per_user() {
        let store = test_store().await;
        store
            .create_summary("u1", "text", "Notes", "content", "source text")
            .await
            .unwrap();
        store
            .create_summary("u2", "text", "Other", "content", "source text")
            .await
            .unwrap();

        let mine = store.list_summaries("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Notes");
    }

    #[tokio::test]
    async fn original_is_truncated_to_an_excerpt() {
        let store = test_store().await;
        let long_source = "x".repeat(500);
        store
            .create_summary("u1", "text", "Long", "content", &long_source)
            .await
            .unwrap();

        let summaries = store.list_summaries("u1").await.unwrap();
        assert_eq!(summaries[0].original.chars().count(), 100);
    }

    #[tokio::test]
    async fn delete_enforces_ownership() {
        let store = test_store().await;
        let id = store
            .create_summary("owner", "text", "Mine", "content", "src")
            .await
            .unwrap();

        let err = store.delete_summary("intruder", &id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        store.delete_summary("owner", &id).await.unwrap();
        assert!(store.list_summaries("owner").await.unwrap().is_empty());
    }
}

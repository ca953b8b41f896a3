//! Conversation turn storage.
//!
//! Turns are append-only rows scoped to one document and one user; the
//! autoincrement row id is the write order, and history is read back in
//! that order so user/bot pairs reconstruct faithfully. Turns die with
//! their document (FK cascade) and are never mutated.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::errors::ApiError;

const MAX_HISTORY_LIMIT: i64 = 1000;

pub const ROLE_USER: &str = "user";
pub const ROLE_BOT: &str = "bot";

#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub document_id: String,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, ApiError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS conversation_turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('user', 'bot')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_turns_document_id ON conversation_turns(document_id, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn append_turn(
        &self,
        document_id: &str,
        user_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO conversation_turns (document_id, user_id, role, content)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(document_id)
        .bind(user_id)
        .bind(role)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    /// Records one question/answer exchange in order: the user turn first,
    /// then the bot turn.
    pub async fn append_exchange(
        &self,
        document_id: &str,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), ApiError> {
        self.append_turn(document_id, user_id, ROLE_USER, question)
            .await?;
        self.append_turn(document_id, user_id, ROLE_BOT, answer).await
    }

    pub async fn get_history(
        &self,
        document_id: &str,
        limit: i64,
    ) -> Result<Vec<ConversationTurn>, ApiError> {
        let limit = sanitize_limit(limit);

        let rows = sqlx::query(
            "SELECT id, document_id, user_id, role, content, created_at
             FROM (
                 SELECT id, document_id, user_id, role, content, created_at
                 FROM conversation_turns
                 WHERE document_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2
             )
             ORDER BY id ASC",
        )
        .bind(document_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        rows.into_iter()
            .map(turn_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::internal)
    }

    pub async fn turn_count(&self, document_id: &str) -> Result<i64, ApiError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversation_turns WHERE document_id = ?1",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::internal)
    }
}

fn turn_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ConversationTurn, sqlx::Error> {
    Ok(ConversationTurn {
        id: row.try_get("id")?,
        document_id: row.try_get("document_id")?,
        user_id: row.try_get("user_id")?,
        role: row.try_get("role")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn sanitize_limit(limit: i64) -> i64 {
    if limit <= 0 {
        return 1;
    }
    limit.min(MAX_HISTORY_LIMIT)
}

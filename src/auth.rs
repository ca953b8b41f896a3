//! Accounts and session tokens.
//!
//! Registration creates `pending` users; an admin must approve an account
//! before login succeeds. Login verifies the argon2 hash and issues an
//! opaque bearer token presented via the `x-api-key` header. Resolving a
//! token yields the authenticated user's id, role, and status; every
//! pipeline entry point requires that identity before doing any work.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::HeaderMap;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::ApiError;

const API_KEY_HEADER: &str = "x-api-key";

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub document_count: i64,
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, ApiError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('user', 'admin')),
                status TEXT NOT NULL CHECK(status IN ('pending', 'approved')),
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        if existing.is_some() {
            return Err(ApiError::BadRequest("User already exists".to_string()));
        }

        let user_id = Uuid::new_v4().to_string();
        let password_hash = hash_password(password)?;

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user_id)
        .bind(&email)
        .bind(&password_hash)
        .bind(ROLE_USER)
        .bind(STATUS_PENDING)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(user_id)
    }

    /// Verifies credentials and issues a session token. Pending accounts
    /// authenticate but are refused until approved.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, AuthUser), ApiError> {
        let email = email.trim().to_ascii_lowercase();

        let row = sqlx::query(
            "SELECT id, email, password_hash, role, status FROM users WHERE email = ?1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::Unauthorized)?;

        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash) {
            return Err(ApiError::Unauthorized);
        }

        let user = AuthUser {
            id: row.get("id"),
            email: row.get("email"),
            role: row.get("role"),
            status: row.get("status"),
        };

        if user.status != STATUS_APPROVED {
            return Err(ApiError::Forbidden(
                "Account is awaiting approval".to_string(),
            ));
        }

        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES (?1, ?2)")
            .bind(&token)
            .bind(&user.id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok((token, user))
    }

    pub async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, ApiError> {
        if token.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query(
            "SELECT u.id, u.email, u.role, u.status
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.map(|row| AuthUser {
            id: row.get("id"),
            email: row.get("email"),
            role: row.get("role"),
            status: row.get("status"),
        }))
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        status: Option<&str>,
        role: Option<&str>,
    ) -> Result<bool, ApiError> {
        if let Some(status) = status {
            if status != STATUS_PENDING && status != STATUS_APPROVED {
                return Err(ApiError::BadRequest(format!("Unknown status '{}'", status)));
            }
            let updated = sqlx::query("UPDATE users SET status = ?1 WHERE id = ?2")
                .bind(status)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(ApiError::internal)?;
            if updated.rows_affected() == 0 {
                return Ok(false);
            }
        }

        if let Some(role) = role {
            if role != ROLE_USER && role != ROLE_ADMIN {
                return Err(ApiError::BadRequest(format!("Unknown role '{}'", role)));
            }
            let updated = sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2")
                .bind(role)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(ApiError::internal)?;
            if updated.rows_affected() == 0 {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// All users with their document counts, newest first. Password hashes
    /// never leave the store.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT u.id, u.email, u.role, u.status, u.created_at,
                    (SELECT COUNT(*) FROM documents WHERE user_id = u.id) AS document_count
             FROM users u
             ORDER BY u.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| UserRecord {
                id: row.get("id"),
                email: row.get("email"),
                role: row.get("role"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                document_count: row.get("document_count"),
            })
            .collect())
    }

    pub async fn user_stats(&self) -> Result<(i64, i64, i64), ApiError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = 'approved'")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok((total, active, pending))
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(ApiError::internal)
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Resolves the request identity or rejects with 401 before any pipeline
/// logic runs.
pub async fn require_user(headers: &HeaderMap, users: &UserStore) -> Result<AuthUser, ApiError> {
    users
        .resolve_token(bearer_token(headers))
        .await?
        .ok_or(ApiError::Unauthorized)
}

pub async fn require_admin(headers: &HeaderMap, users: &UserStore) -> Result<AuthUser, ApiError> {
    let user = require_user(headers, users).await?;
    if user.role != ROLE_ADMIN {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_store() -> UserStore {
        let path = std::env::temp_dir().join(format!("paperbase-users-{}.db", Uuid::new_v4()));
        let pool = db::connect(&path).await.unwrap();
        // documents table referenced by list_users' count subquery
        crate::rag::store::DocumentStore::new(pool.clone(), 2).await.unwrap();
        UserStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn register_login_approve_flow() {
        let store = test_store().await;

        let user_id = store.register("Ada@example.com", "hunter22").await.unwrap();

        // Pending accounts cannot log in yet.
        let err = store.login("ada@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        store
            .update_user(&user_id, Some(STATUS_APPROVED), None)
            .await
            .unwrap();

        let (token, user) = store.login("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.status, STATUS_APPROVED);

        let resolved = store.resolve_token(&token).await.unwrap().unwrap();
        assert_eq!(resolved.id, user_id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_unauthorized() {
        let store = test_store().await;
        let user_id = store.register("bob@example.com", "correct").await.unwrap();
        store
            .update_user(&user_id, Some(STATUS_APPROVED), None)
            .await
            .unwrap();

        let wrong = store.login("bob@example.com", "incorrect").await.unwrap_err();
        assert!(matches!(wrong, ApiError::Unauthorized));

        let unknown = store.login("nobody@example.com", "x").await.unwrap_err();
        assert!(matches!(unknown, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = test_store().await;
        store.register("eve@example.com", "pw").await.unwrap();

        let err = store.register("eve@example.com", "pw2").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn require_admin_rejects_plain_users() {
        let store = test_store().await;
        let user_id = store.register("carol@example.com", "pw").await.unwrap();
        store
            .update_user(&user_id, Some(STATUS_APPROVED), None)
            .await
            .unwrap();
        let (token, _) = store.login("carol@example.com", "pw").await.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, token.parse().unwrap());

        assert!(require_user(&headers, &store).await.is_ok());
        let err = require_admin(&headers, &store).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        store
            .update_user(&user_id, None, Some(ROLE_ADMIN))
            .await
            .unwrap();
        assert!(require_admin(&headers, &store).await.is_ok());
    }

    #[tokio::test]
    async fn missing_or_bogus_token_is_unauthorized() {
        let store = test_store().await;

        let headers = HeaderMap::new();
        let err = require_user(&headers, &store).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "not-a-real-token".parse().unwrap());
        let err = require_user(&headers, &store).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}

//! Session repository implementation.
//!
//! One row per live refresh token. Rotation is modeled as delete-old +
//! insert-new inside a single transaction rather than an update-in-place,
//! so a concurrently consumed token surfaces as a zero-row delete instead
//! of a silently doubled session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use printquote_core::error::{AppError, ErrorKind};
use printquote_core::result::AppResult;
use printquote_entity::session::model::{CreateSession, Session, SessionIdentity};
use printquote_entity::session::repo::SessionRepo;
use printquote_entity::user::model::UserProfile;

/// Repository for refresh-token session rows.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row shape for the session-with-owner join.
#[derive(Debug, FromRow)]
struct SessionUserRow {
    id: Uuid,
    user_id: Uuid,
    refresh_token: String,
    fingerprint: Option<String>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    email: String,
    username: String,
    is_activated: bool,
}

impl From<SessionUserRow> for SessionIdentity {
    fn from(row: SessionUserRow) -> Self {
        Self {
            session: Session {
                id: row.id,
                user_id: row.user_id,
                refresh_token: row.refresh_token,
                fingerprint: row.fingerprint,
                user_agent: row.user_agent,
                ip_address: row.ip_address,
                expires_at: row.expires_at,
                created_at: row.created_at,
            },
            user: UserProfile {
                id: row.user_id,
                email: row.email,
                username: row.username,
                is_activated: row.is_activated,
            },
        }
    }
}

#[async_trait]
impl SessionRepo for SessionRepository {
    async fn create(&self, session: &CreateSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions \
             (id, user_id, refresh_token, fingerprint, user_agent, ip_address, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(&session.refresh_token)
        .bind(&session.fingerprint)
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn find_valid_by_token(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<SessionIdentity>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            "SELECT s.id, s.user_id, s.refresh_token, s.fingerprint, s.user_agent, \
                    s.ip_address, s.expires_at, s.created_at, \
                    u.email, u.username, u.is_activated \
             FROM sessions s \
             INNER JOIN users u ON u.id = s.user_id \
             WHERE s.refresh_token = $1 AND s.expires_at > NOW()",
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by token", e)
        })?;

        Ok(row.map(SessionIdentity::from))
    }

    async fn find_valid_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 AND expires_at > NOW() \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list user sessions", e)
        })
    }

    async fn replace(
        &self,
        old_token: &str,
        successor: &CreateSession,
    ) -> AppResult<Option<Session>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin rotation", e)
        })?;

        let deleted = sqlx::query("DELETE FROM sessions WHERE refresh_token = $1")
            .bind(old_token)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete rotated session", e)
            })?;

        if deleted.rows_affected() == 0 {
            // Token already consumed or revoked; the successor must not
            // be inserted.
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back rotation", e)
            })?;
            return Ok(None);
        }

        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions \
             (id, user_id, refresh_token, fingerprint, user_agent, ip_address, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(successor.user_id)
        .bind(&successor.refresh_token)
        .bind(&successor.fingerprint)
        .bind(&successor.user_agent)
        .bind(&successor.ip_address)
        .bind(successor.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert successor session", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rotation", e)
        })?;

        Ok(Some(session))
    }

    async fn delete_by_token(&self, refresh_token: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE refresh_token = $1")
            .bind(refresh_token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete session", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn delete_all_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete user sessions", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn delete_all_except(&self, user_id: Uuid, current_token: &str) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND refresh_token <> $2")
                .bind(user_id)
                .bind(current_token)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete other sessions", e)
                })?;
        Ok(result.rows_affected())
    }

    async fn prune_oldest(&self, user_id: Uuid, keep: u32) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE user_id = $1 AND id NOT IN ( \
                 SELECT id FROM sessions WHERE user_id = $1 \
                 ORDER BY created_at DESC LIMIT $2 \
             )",
        )
        .bind(user_id)
        .bind(keep as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to prune sessions", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete expired sessions", e)
            })?;
        Ok(result.rows_affected())
    }
}

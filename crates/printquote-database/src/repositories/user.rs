//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use printquote_core::error::{AppError, ErrorKind};
use printquote_core::result::AppResult;
use printquote_entity::user::model::{CreateUser, User};
use printquote_entity::user::repo::CredentialRepo;

/// Repository for user identity and password-hash operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepo for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    async fn create(&self, user: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, username, password_hash, activation_token) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.activation_token)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update password hash", e)
            })?;
        Ok(())
    }

    async fn activate(&self, activation_token: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_activated = TRUE, activation_token = NULL, updated_at = NOW() \
             WHERE activation_token = $1 RETURNING *",
        )
        .bind(activation_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to activate user", e))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        reset_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(reset_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set reset token", e))?;
        Ok(())
    }

    async fn find_by_valid_reset_token(&self, reset_token: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE reset_token = $1 AND reset_token_expires_at > NOW()",
        )
        .bind(reset_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by reset token", e)
        })
    }

    async fn clear_reset_token(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET reset_token = NULL, reset_token_expires_at = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clear reset token", e)
        })?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Translates a unique-constraint violation on email or username into the
/// duplicate-identity domain error; everything else stays a database error.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("users_email_key") => "Email already exists",
                Some("users_username_key") => "Username already exists",
                _ => "Email or username already exists",
            };
            return AppError::duplicate_identity(message);
        }
    }
    AppError::with_source(ErrorKind::Database, "Failed to create user", err)
}

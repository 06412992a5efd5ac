//! Credential store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use printquote_core::result::AppResult;

use super::model::{CreateUser, User};

/// Persistence boundary for user identity and password hashes.
///
/// The session manager only ever consumes `find_by_id`-shaped identity
/// data to build claims payloads; it must never receive or log the
/// password hash.
#[async_trait]
pub trait CredentialRepo: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Create a new user. A unique violation on email or username maps
    /// to `ErrorKind::DuplicateIdentity`.
    async fn create(&self, user: &CreateUser) -> AppResult<User>;

    /// Replace the stored password hash.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Activate the account matching the given activation token.
    /// Returns the activated user, or `None` if no account matches.
    async fn activate(&self, activation_token: &str) -> AppResult<Option<User>>;

    /// Store a password-reset token with its expiry.
    async fn set_reset_token(
        &self,
        id: Uuid,
        reset_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Find the user holding the given reset token, provided it has not
    /// expired.
    async fn find_by_valid_reset_token(&self, reset_token: &str) -> AppResult<Option<User>>;

    /// Clear any pending reset token.
    async fn clear_reset_token(&self, id: Uuid) -> AppResult<()>;

    /// Delete a user. Sessions cascade.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

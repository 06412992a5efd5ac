//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user in the PrintQuote system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address (unique).
    pub email: String,
    /// Login name (unique).
    pub username: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account has completed email activation.
    pub is_activated: bool,
    /// Pending activation token (cleared on activation).
    pub activation_token: Option<String>,
    /// Pending password-reset token.
    pub reset_token: Option<String>,
    /// When the reset token stops being accepted.
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the claims-shaped public view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            is_activated: self.is_activated,
        }
    }
}

/// The identity payload embedded in tokens and returned to clients.
///
/// This is the only user data the token subsystem ever sees; the
/// password hash stays behind the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Whether the account has completed email activation.
    pub is_activated: bool,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Activation token to deliver by mail.
    pub activation_token: String,
}

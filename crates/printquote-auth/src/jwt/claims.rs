//! JWT claims structure used in access and refresh tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use printquote_entity::user::UserProfile;

/// Claims payload embedded in every issued token.
///
/// Access tokens are validated from these claims alone; no store lookup
/// happens on the request path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: Uuid,
    /// Unique token identifier. Keeps tokens issued for the same user
    /// within the same second from colliding as strings.
    pub jti: Uuid,
    /// Email at the time of issuance.
    pub email: String,
    /// Username at the time of issuance.
    pub username: String,
    /// Whether the account was activated at issuance.
    pub is_activated: bool,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token type: "access" or "refresh".
    pub token_type: TokenType,
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token for API requests.
    Access,
    /// Long-lived refresh token for obtaining new token pairs.
    Refresh,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Rebuilds the identity payload carried by this token.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.sub,
            email: self.email.clone(),
            username: self.username.clone(),
            is_activated: self.is_activated,
        }
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

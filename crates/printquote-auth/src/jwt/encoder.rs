//! JWT token creation with per-kind signing secrets.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use printquote_core::config::auth::AuthConfig;
use printquote_core::error::AppError;
use printquote_entity::user::UserProfile;

use super::claims::{Claims, TokenType};

/// Creates signed access and refresh tokens.
///
/// Each token kind signs with its own secret; `AuthConfig::validate`
/// rejects a configuration where the two coincide, since a shared secret
/// would let a refresh token pass as an access token.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for access tokens.
    access_key: EncodingKey,
    /// HMAC secret key for refresh tokens.
    refresh_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in days.
    refresh_ttl_days: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_minutes: config.access_ttl_minutes as i64,
            refresh_ttl_days: config.refresh_ttl_days as i64,
        }
    }

    /// Generates a new access + refresh token pair for the given identity.
    pub fn generate_token_pair(&self, user: &UserProfile) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let access_exp = now + chrono::Duration::minutes(self.access_ttl_minutes);
        let refresh_exp = now + chrono::Duration::days(self.refresh_ttl_days);

        let access_token = self.sign(user, now, access_exp, TokenType::Access)?;
        let refresh_token = self.sign(user, now, refresh_exp, TokenType::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: access_exp,
            refresh_expires_at: refresh_exp,
        })
    }

    fn sign(
        &self,
        user: &UserProfile,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        kind: TokenType,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            email: user.email.clone(),
            username: user.username.clone(),
            is_activated: user.is_activated,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            token_type: kind,
        };

        let key = match kind {
            TokenType::Access => &self.access_key,
            TokenType::Refresh => &self.refresh_key,
        };

        encode(&Header::default(), &claims, key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}

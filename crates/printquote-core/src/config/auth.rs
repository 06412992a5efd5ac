//! Authentication and token configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for signing access tokens (HMAC-SHA256).
    #[serde(default = "default_access_secret")]
    pub access_secret: String,
    /// Secret key for signing refresh tokens. Must differ from
    /// `access_secret`; a shared secret would let a refresh token
    /// pass access-token verification.
    #[serde(default = "default_refresh_secret")]
    pub refresh_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Password-reset token TTL in minutes.
    #[serde(default = "default_reset_ttl")]
    pub reset_token_ttl_minutes: u64,
}

impl AuthConfig {
    /// Checks that the signing secrets are usable.
    ///
    /// Reusing one secret for both token kinds is a configuration error,
    /// not a degraded mode.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(AppError::configuration("JWT secrets must not be empty"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(AppError::configuration(
                "Access and refresh token secrets must be distinct",
            ));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: default_access_secret(),
            refresh_secret: default_refresh_secret(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            password_min_length: default_password_min(),
            reset_token_ttl_minutes: default_reset_ttl(),
        }
    }
}

fn default_access_secret() -> String {
    "CHANGE_ME_ACCESS_IN_PRODUCTION".to_string()
}

fn default_refresh_secret() -> String {
    "CHANGE_ME_REFRESH_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_password_min() -> usize {
    6
}

fn default_reset_ttl() -> u64 {
    60
}

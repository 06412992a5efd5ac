//! JWT token verification with per-kind secrets.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use printquote_core::config::auth::AuthConfig;
use printquote_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates access and refresh tokens.
///
/// Expected failures (malformed input, bad signature, elapsed expiry) are
/// returned as typed errors, never panics. Validity is determined purely
/// by the signature and the embedded expiry; no store is consulted.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for access tokens.
    access_key: DecodingKey,
    /// HMAC secret key for refresh tokens.
    refresh_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Exact expiry enforcement; no clock-skew allowance.
        validation.leeway = 0;

        Self {
            access_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_token(token, TokenType::Access)
    }

    /// Decodes and validates a refresh token string.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_token(token, TokenType::Refresh)
    }

    /// Verifies signature, expiry, and token kind.
    fn decode_token(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let key = match expected {
            TokenType::Access => &self.access_key,
            TokenType::Refresh => &self.refresh_key,
        };

        let token_data = decode::<Claims>(token, key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::expired_token("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::invalid_token("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::invalid_token("Invalid token signature")
                }
                _ => AppError::invalid_token(format!("Token validation failed: {e}")),
            }
        })?;

        if token_data.claims.token_type != expected {
            return Err(AppError::invalid_token("Unexpected token type"));
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use chrono::Utc;
    use printquote_core::error::ErrorKind;
    use printquote_entity::user::UserProfile;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn test_user() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: "maker@example.com".to_string(),
            username: "maker".to_string(),
            is_activated: true,
        }
    }

    #[test]
    fn test_issue_then_verify_round_trips_identity() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let user = test_user();

        let pair = encoder.generate_token_pair(&user).unwrap();

        let claims = decoder.decode_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id(), user.id);
        assert_eq!(claims.profile(), user);

        let claims = decoder.decode_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.user_id(), user.id);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let pair = encoder.generate_token_pair(&test_user()).unwrap();

        let err = decoder.decode_access_token(&pair.refresh_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);

        let err = decoder.decode_refresh_token(&pair.access_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let decoder = JwtDecoder::new(&test_config());
        let err = decoder.decode_access_token("not.a.token").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let other = AuthConfig {
            access_secret: "different-access-secret".to_string(),
            refresh_secret: "different-refresh-secret".to_string(),
            ..AuthConfig::default()
        };
        let decoder = JwtDecoder::new(&other);

        let pair = encoder.generate_token_pair(&test_user()).unwrap();
        let err = decoder.decode_access_token(&pair.access_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_elapsed_expiry_is_expired() {
        let config = test_config();
        let decoder = JwtDecoder::new(&config);
        let user = test_user();

        let claims = Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            is_activated: true,
            iat: Utc::now().timestamp() - 120,
            exp: Utc::now().timestamp() - 60,
            token_type: TokenType::Access,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .unwrap();

        let err = decoder.decode_access_token(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpiredToken);
    }
}

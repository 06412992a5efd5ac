//! Unified application error types for PrintQuote.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Wrong password or unknown identifier. Always reported with the
    /// same message regardless of which part was wrong, so a caller
    /// cannot enumerate accounts.
    InvalidCredentials,
    /// A token failed signature or format verification.
    InvalidToken,
    /// A token's embedded expiry has elapsed.
    ExpiredToken,
    /// A refresh token carried a valid signature but no live session
    /// backs it (revoked, already rotated, or never issued).
    SessionNotFound,
    /// Registration against an already-taken email or username.
    DuplicateIdentity,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// Outbound mail delivery failed.
    Mail,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// The stable HTTP status the boundary layer maps this kind to.
    ///
    /// Token and credential failures are all 401, duplicates 409, and
    /// malformed input 400. None of these are fatal to the process.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::ExpiredToken
            | Self::SessionNotFound => 401,
            Self::DuplicateIdentity => 409,
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Database
            | Self::Configuration
            | Self::Serialization
            | Self::Mail
            | Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::ExpiredToken => write!(f, "EXPIRED_TOKEN"),
            Self::SessionNotFound => write!(f, "SESSION_NOT_FOUND"),
            Self::DuplicateIdentity => write!(f, "DUPLICATE_IDENTITY"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Mail => write!(f, "MAIL"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout PrintQuote.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-credentials error with the fixed message used
    /// for every credential failure.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid email or password")
    }

    /// Create an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    /// Create an expired-token error.
    pub fn expired_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpiredToken, message)
    }

    /// Create a session-not-found error.
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionNotFound, message)
    }

    /// Create a duplicate-identity error.
    pub fn duplicate_identity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateIdentity, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a mail delivery error.
    pub fn mail(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Mail, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_map_to_401() {
        assert_eq!(ErrorKind::InvalidCredentials.http_status(), 401);
        assert_eq!(ErrorKind::InvalidToken.http_status(), 401);
        assert_eq!(ErrorKind::ExpiredToken.http_status(), 401);
        assert_eq!(ErrorKind::SessionNotFound.http_status(), 401);
    }

    #[test]
    fn test_duplicate_maps_to_409() {
        assert_eq!(ErrorKind::DuplicateIdentity.http_status(), 409);
        assert_eq!(ErrorKind::Validation.http_status(), 400);
    }

    #[test]
    fn test_credential_failure_message_is_uniform() {
        let unknown_email = AppError::invalid_credentials();
        let wrong_password = AppError::invalid_credentials();
        assert_eq!(unknown_email.message, wrong_password.message);
    }
}

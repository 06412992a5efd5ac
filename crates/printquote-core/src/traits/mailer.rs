//! Outbound mail boundary trait.
//!
//! Actual delivery (SMTP, provider API) lives outside this system; the
//! auth flows only need a way to hand off activation and reset messages.
//! Secrets such as reset tokens travel exclusively through this channel,
//! never back to the API caller.

use async_trait::async_trait;

use crate::result::AppResult;

/// Delivers account-related mail out of band.
#[async_trait]
pub trait MailSender: Send + Sync + 'static {
    /// Sends an account activation message carrying the activation token.
    async fn send_activation(&self, email: &str, activation_token: &str) -> AppResult<()>;

    /// Sends a password-reset message carrying the reset token.
    async fn send_password_reset(&self, email: &str, reset_token: &str) -> AppResult<()>;
}

/// Mail sender that records deliveries in the log instead of sending.
///
/// Stands in until a real transport is wired up at the boundary. Tokens
/// are not logged.
#[derive(Debug, Clone, Default)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_activation(&self, email: &str, _activation_token: &str) -> AppResult<()> {
        tracing::info!(email = %email, "Activation mail queued");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, _reset_token: &str) -> AppResult<()> {
        tracing::info!(email = %email, "Password reset mail queued");
        Ok(())
    }
}

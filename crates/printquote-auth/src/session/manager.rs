//! Session lifecycle manager — issuance, rotation, and revocation flows.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use printquote_core::config::session::SessionConfig;
use printquote_core::error::AppError;
use printquote_core::result::AppResult;
use printquote_entity::session::{CreateSession, SessionMetadata, SessionRepo, SessionView};
use printquote_entity::user::UserProfile;

use crate::jwt::encoder::TokenPair;
use crate::jwt::{JwtDecoder, JwtEncoder};

/// Result of a successful token rotation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RefreshedTokens {
    /// The successor token pair.
    pub tokens: TokenPair,
    /// The identity the tokens were issued for, taken from the stored
    /// session rather than re-derived from the credential store.
    pub user: UserProfile,
}

/// Manages the refresh-token session state machine.
///
/// Access tokens stay stateless; every refresh token is backed by exactly
/// one store row whose validity is transferred to its successor on use.
#[derive(Clone)]
pub struct SessionManager {
    /// JWT encoder for token generation.
    encoder: Arc<JwtEncoder>,
    /// JWT decoder for token validation.
    decoder: Arc<JwtDecoder>,
    /// Session persistence.
    sessions: Arc<dyn SessionRepo>,
    /// Session configuration.
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager over an injected session store.
    pub fn new(
        encoder: Arc<JwtEncoder>,
        decoder: Arc<JwtDecoder>,
        sessions: Arc<dyn SessionRepo>,
        config: SessionConfig,
    ) -> Self {
        Self {
            encoder,
            decoder,
            sessions,
            config,
        }
    }

    /// Issues an access + refresh pair and persists the refresh session.
    ///
    /// Before inserting, the user's session set is pruned down so the cap
    /// (`max_sessions_per_user`) holds after the insert. Evicting the
    /// oldest sessions is silent backpressure, not a failure.
    pub async fn issue_auth_tokens(
        &self,
        user: &UserProfile,
        metadata: SessionMetadata,
    ) -> AppResult<TokenPair> {
        let tokens = self.encoder.generate_token_pair(user)?;

        let keep = self.config.max_sessions_per_user.saturating_sub(1);
        let pruned = self.sessions.prune_oldest(user.id, keep).await?;
        if pruned > 0 {
            info!(
                user_id = %user.id,
                pruned = pruned,
                cap = self.config.max_sessions_per_user,
                "Evicted oldest sessions over cap"
            );
        }

        self.sessions
            .create(&CreateSession::new(
                user.id,
                tokens.refresh_token.clone(),
                metadata,
                tokens.refresh_expires_at,
            ))
            .await?;

        debug!(user_id = %user.id, "Issued auth token pair");
        Ok(tokens)
    }

    /// Rotates a refresh token into a successor pair.
    ///
    /// The token must carry a valid signature and unexpired embedded
    /// expiry, and a live session row must hold its exact value. The old
    /// row is atomically replaced by the successor; a token that was
    /// already rotated, revoked, or never issued fails with
    /// `SessionNotFound`. This is the replay defense: each refresh token
    /// rotates successfully at most once.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshedTokens> {
        self.decoder.decode_refresh_token(refresh_token)?;

        let identity = self
            .sessions
            .find_valid_by_token(refresh_token)
            .await?
            .ok_or_else(|| AppError::session_not_found("No live session for refresh token"))?;

        let tokens = self.encoder.generate_token_pair(&identity.user)?;

        // Device metadata carries over to the successor session.
        let successor = CreateSession::new(
            identity.user.id,
            tokens.refresh_token.clone(),
            SessionMetadata {
                fingerprint: identity.session.fingerprint.clone(),
                user_agent: identity.session.user_agent.clone(),
                ip_address: identity.session.ip_address.clone(),
            },
            tokens.refresh_expires_at,
        );

        self.sessions
            .replace(refresh_token, &successor)
            .await?
            .ok_or_else(|| {
                // Lost a race against a concurrent rotation or revocation
                // between lookup and replace.
                AppError::session_not_found("Refresh token already consumed")
            })?;

        info!(user_id = %identity.user.id, "Rotated refresh token");

        Ok(RefreshedTokens {
            tokens,
            user: identity.user,
        })
    }

    /// Lists a user's live sessions for display, token values omitted.
    pub async fn list_sessions(&self, user_id: Uuid) -> AppResult<Vec<SessionView>> {
        let sessions = self.sessions.find_valid_by_user(user_id).await?;
        Ok(sessions.iter().map(SessionView::from).collect())
    }

    /// Revokes the single session holding the given token.
    ///
    /// Idempotent: revoking a token with no session is not an error.
    pub async fn revoke_one(&self, refresh_token: &str) -> AppResult<()> {
        let removed = self.sessions.delete_by_token(refresh_token).await?;
        debug!(removed = removed, "Revoked session by token");
        Ok(())
    }

    /// Revokes every session belonging to the user ("logout everywhere").
    pub async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64> {
        let removed = self.sessions.delete_all_by_user(user_id).await?;
        info!(user_id = %user_id, removed = removed, "Revoked all sessions");
        Ok(removed)
    }

    /// Revokes every session belonging to the user except the one holding
    /// `current_token` ("sign out other devices").
    pub async fn revoke_all_except(
        &self,
        user_id: Uuid,
        current_token: &str,
    ) -> AppResult<u64> {
        let removed = self
            .sessions
            .delete_all_except(user_id, current_token)
            .await?;
        info!(user_id = %user_id, removed = removed, "Revoked other sessions");
        Ok(removed)
    }

    /// Deletes every session whose expiry has elapsed.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let removed = self.sessions.delete_expired().await?;
        if removed > 0 {
            info!(removed = removed, "Swept expired sessions");
        }
        Ok(removed)
    }
}

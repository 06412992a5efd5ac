//! Account service — credential checks feeding the token lifecycle.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use printquote_core::config::auth::AuthConfig;
use printquote_core::error::{AppError, ErrorKind};
use printquote_core::result::AppResult;
use printquote_core::traits::MailSender;
use printquote_entity::session::SessionMetadata;
use printquote_entity::user::{CreateUser, CredentialRepo, UserProfile};

use crate::jwt::encoder::TokenPair;
use crate::password::PasswordHasher;
use crate::session::SessionManager;

/// Result of a successful registration or login.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthPayload {
    /// The authenticated identity.
    pub user: UserProfile,
    /// The issued token pair.
    pub tokens: TokenPair,
}

/// Orchestrates account flows over the credential store.
///
/// Password hashes never leave this service; the session manager only
/// sees claims-shaped identity data. Reset and activation tokens travel
/// exclusively through the mail channel.
#[derive(Clone)]
pub struct AccountService {
    /// Credential persistence.
    users: Arc<dyn CredentialRepo>,
    /// Password hashing.
    hasher: Arc<PasswordHasher>,
    /// Token issuance and revocation.
    sessions: Arc<SessionManager>,
    /// Out-of-band mail delivery.
    mailer: Arc<dyn MailSender>,
    /// Auth configuration.
    config: AuthConfig,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish()
    }
}

impl AccountService {
    /// Creates a new account service with all required dependencies.
    pub fn new(
        users: Arc<dyn CredentialRepo>,
        hasher: Arc<PasswordHasher>,
        sessions: Arc<SessionManager>,
        mailer: Arc<dyn MailSender>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            hasher,
            sessions,
            mailer,
            config,
        }
    }

    /// Registers a new account and logs it in.
    ///
    /// Duplicate email or username fails with `DuplicateIdentity`. The
    /// activation token goes out by mail; the caller gets tokens and the
    /// public profile only.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        metadata: SessionMetadata,
    ) -> AppResult<AuthPayload> {
        if username.is_empty() || email.is_empty() {
            return Err(AppError::validation("Username and email are required"));
        }
        self.check_password_policy(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::duplicate_identity("Email already exists"));
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::duplicate_identity("Username already exists"));
        }

        let password_hash = self.hasher.hash_password(password)?;
        let activation_token = generate_opaque_token();

        // The unique constraints backstop the pre-checks under races.
        let user = self
            .users
            .create(&CreateUser {
                email: email.to_string(),
                username: username.to_string(),
                password_hash,
                activation_token: activation_token.clone(),
            })
            .await?;

        self.mailer
            .send_activation(&user.email, &activation_token)
            .await?;

        let profile = user.profile();
        let tokens = self.sessions.issue_auth_tokens(&profile, metadata).await?;

        info!(user_id = %profile.id, "User registered");
        Ok(AuthPayload {
            user: profile,
            tokens,
        })
    }

    /// Authenticates by email and password and issues tokens.
    ///
    /// Unknown email and wrong password produce the identical failure so
    /// a caller cannot tell which part was wrong.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        metadata: SessionMetadata,
    ) -> AppResult<AuthPayload> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AppError::invalid_credentials());
        }

        let profile = user.profile();
        let tokens = self.sessions.issue_auth_tokens(&profile, metadata).await?;

        info!(user_id = %profile.id, "Login successful");
        Ok(AuthPayload {
            user: profile,
            tokens,
        })
    }

    /// Activates the account matching the mailed activation token.
    pub async fn activate(&self, activation_token: &str) -> AppResult<UserProfile> {
        let user = self
            .users
            .activate(activation_token)
            .await?
            .ok_or_else(|| AppError::not_found("Invalid activation link"))?;

        info!(user_id = %user.id, "Account activated");
        Ok(user.profile())
    }

    /// Changes the password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::new(
                ErrorKind::InvalidCredentials,
                "Current password is incorrect",
            ));
        }

        self.check_password_policy(new_password)?;

        let password_hash = self.hasher.hash_password(new_password)?;
        self.users
            .update_password_hash(user_id, &password_hash)
            .await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Starts a password reset.
    ///
    /// Succeeds silently for unknown emails. The reset token is stored
    /// with an expiry and delivered only through the mail channel; it is
    /// never part of the response.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let reset_token = generate_opaque_token();
        let expires_at =
            Utc::now() + chrono::Duration::minutes(self.config.reset_token_ttl_minutes as i64);

        self.users
            .set_reset_token(user.id, &reset_token, expires_at)
            .await?;
        self.mailer
            .send_password_reset(&user.email, &reset_token)
            .await?;

        info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Completes a password reset with a mailed token.
    ///
    /// Every session is revoked: a reset usually means the old credential
    /// can no longer be trusted.
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> AppResult<()> {
        self.check_password_policy(new_password)?;

        let user = self
            .users
            .find_by_valid_reset_token(reset_token)
            .await?
            .ok_or_else(|| AppError::invalid_token("Invalid or expired reset token"))?;

        let password_hash = self.hasher.hash_password(new_password)?;
        self.users
            .update_password_hash(user.id, &password_hash)
            .await?;
        self.users.clear_reset_token(user.id).await?;
        self.sessions.revoke_all(user.id).await?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Deletes the account after a password check.
    pub async fn delete_account(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AppError::new(
                ErrorKind::InvalidCredentials,
                "Password is incorrect",
            ));
        }

        self.sessions.revoke_all(user_id).await?;
        self.users.delete(user_id).await?;

        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    fn check_password_policy(&self, password: &str) -> AppResult<()> {
        if password.len() < self.config.password_min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                self.config.password_min_length
            )));
        }
        Ok(())
    }
}

/// Generates a 64-character hex token for activation and reset links.
fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{JwtDecoder, JwtEncoder};
    use crate::session::MemorySessionRepo;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use printquote_core::config::session::SessionConfig;
    use printquote_entity::user::User;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// Credential store double backed by a map.
    #[derive(Default)]
    struct MemoryUserRepo {
        users: Mutex<HashMap<Uuid, User>>,
    }

    #[async_trait]
    impl CredentialRepo for MemoryUserRepo {
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
            Ok(self.users.lock().await.get(&id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.username.eq_ignore_ascii_case(username))
                .cloned())
        }

        async fn create(&self, create: &CreateUser) -> AppResult<User> {
            let mut users = self.users.lock().await;
            if users
                .values()
                .any(|u| u.email.eq_ignore_ascii_case(&create.email))
            {
                return Err(AppError::duplicate_identity("Email already exists"));
            }
            if users
                .values()
                .any(|u| u.username.eq_ignore_ascii_case(&create.username))
            {
                return Err(AppError::duplicate_identity("Username already exists"));
            }
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                email: create.email.clone(),
                username: create.username.clone(),
                password_hash: create.password_hash.clone(),
                is_activated: false,
                activation_token: Some(create.activation_token.clone()),
                reset_token: None,
                reset_token_expires_at: None,
                created_at: now,
                updated_at: now,
            };
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
            if let Some(user) = self.users.lock().await.get_mut(&id) {
                user.password_hash = password_hash.to_string();
            }
            Ok(())
        }

        async fn activate(&self, activation_token: &str) -> AppResult<Option<User>> {
            let mut users = self.users.lock().await;
            let found = users
                .values_mut()
                .find(|u| u.activation_token.as_deref() == Some(activation_token));
            Ok(found.map(|user| {
                user.is_activated = true;
                user.activation_token = None;
                user.clone()
            }))
        }

        async fn set_reset_token(
            &self,
            id: Uuid,
            reset_token: &str,
            expires_at: DateTime<Utc>,
        ) -> AppResult<()> {
            if let Some(user) = self.users.lock().await.get_mut(&id) {
                user.reset_token = Some(reset_token.to_string());
                user.reset_token_expires_at = Some(expires_at);
            }
            Ok(())
        }

        async fn find_by_valid_reset_token(&self, reset_token: &str) -> AppResult<Option<User>> {
            let now = Utc::now();
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| {
                    u.reset_token.as_deref() == Some(reset_token)
                        && u.reset_token_expires_at.is_some_and(|e| e > now)
                })
                .cloned())
        }

        async fn clear_reset_token(&self, id: Uuid) -> AppResult<()> {
            if let Some(user) = self.users.lock().await.get_mut(&id) {
                user.reset_token = None;
                user.reset_token_expires_at = None;
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> AppResult<bool> {
            Ok(self.users.lock().await.remove(&id).is_some())
        }
    }

    /// Mail double recording every delivery.
    #[derive(Default)]
    struct RecordingMailSender {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingMailSender {
        async fn last_token_for(&self, kind: &str) -> Option<String> {
            self.sent
                .lock()
                .await
                .iter()
                .rev()
                .find(|(k, _, _)| k == kind)
                .map(|(_, _, token)| token.clone())
        }
    }

    #[async_trait]
    impl MailSender for RecordingMailSender {
        async fn send_activation(&self, email: &str, token: &str) -> AppResult<()> {
            self.sent.lock().await.push((
                "activation".to_string(),
                email.to_string(),
                token.to_string(),
            ));
            Ok(())
        }

        async fn send_password_reset(&self, email: &str, token: &str) -> AppResult<()> {
            self.sent.lock().await.push((
                "reset".to_string(),
                email.to_string(),
                token.to_string(),
            ));
            Ok(())
        }
    }

    struct Harness {
        service: AccountService,
        manager: Arc<SessionManager>,
        session_repo: Arc<MemorySessionRepo>,
        mailer: Arc<RecordingMailSender>,
    }

    fn harness() -> Harness {
        let config = AuthConfig {
            access_secret: "account-access-secret".to_string(),
            refresh_secret: "account-refresh-secret".to_string(),
            ..AuthConfig::default()
        };
        let session_repo = Arc::new(MemorySessionRepo::new());
        let manager = Arc::new(SessionManager::new(
            Arc::new(JwtEncoder::new(&config)),
            Arc::new(JwtDecoder::new(&config)),
            session_repo.clone(),
            SessionConfig::default(),
        ));
        let mailer = Arc::new(RecordingMailSender::default());
        let service = AccountService::new(
            Arc::new(MemoryUserRepo::default()),
            Arc::new(PasswordHasher::new()),
            manager.clone(),
            mailer.clone(),
            config,
        );
        Harness {
            service,
            manager,
            session_repo,
            mailer,
        }
    }

    async fn register_default(h: &Harness) -> AuthPayload {
        let payload = h
            .service
            .register(
                "maker",
                "maker@example.com",
                "spool-weight",
                SessionMetadata::default(),
            )
            .await
            .unwrap();
        // Seed the in-memory session store's identity join.
        h.session_repo.insert_user(payload.user.clone()).await;
        payload
    }

    #[tokio::test]
    async fn test_register_issues_tokens_and_mails_activation() {
        let h = harness();
        let payload = register_default(&h).await;

        assert_eq!(payload.user.username, "maker");
        assert!(!payload.user.is_activated);
        assert!(!payload.tokens.access_token.is_empty());
        assert!(h.mailer.last_token_for("activation").await.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let h = harness();
        register_default(&h).await;

        let same_email = h
            .service
            .register(
                "other",
                "maker@example.com",
                "spool-weight",
                SessionMetadata::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(same_email.kind, ErrorKind::DuplicateIdentity);

        let same_username = h
            .service
            .register(
                "maker",
                "other@example.com",
                "spool-weight",
                SessionMetadata::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(same_username.kind, ErrorKind::DuplicateIdentity);
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let h = harness();
        let err = h
            .service
            .register("maker", "maker@example.com", "abc", SessionMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_login_failure_is_enumeration_safe() {
        let h = harness();
        register_default(&h).await;

        let unknown = h
            .service
            .login("ghost@example.com", "spool-weight", SessionMetadata::default())
            .await
            .unwrap_err();
        let wrong = h
            .service
            .login("maker@example.com", "bad-password", SessionMetadata::default())
            .await
            .unwrap_err();

        assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
        assert_eq!(wrong.kind, ErrorKind::InvalidCredentials);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn test_activation_flow() {
        let h = harness();
        register_default(&h).await;

        let token = h.mailer.last_token_for("activation").await.unwrap();
        let profile = h.service.activate(&token).await.unwrap();
        assert!(profile.is_activated);

        // Tokens are one-shot.
        let err = h.service.activate(&token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reset_flow_revokes_sessions_and_consumes_token() {
        let h = harness();
        let payload = register_default(&h).await;

        h.service
            .request_password_reset("maker@example.com")
            .await
            .unwrap();
        let reset_token = h.mailer.last_token_for("reset").await.unwrap();

        h.service
            .reset_password(&reset_token, "new-spool-weight")
            .await
            .unwrap();

        // All prior sessions are gone.
        let err = h
            .manager
            .refresh(&payload.tokens.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionNotFound);

        // New password works, old one does not.
        h.service
            .login("maker@example.com", "new-spool-weight", SessionMetadata::default())
            .await
            .unwrap();
        let err = h
            .service
            .login("maker@example.com", "spool-weight", SessionMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);

        // The reset token is spent.
        let err = h
            .service
            .reset_password(&reset_token, "another-password")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[tokio::test]
    async fn test_reset_request_for_unknown_email_is_silent() {
        let h = harness();
        h.service
            .request_password_reset("ghost@example.com")
            .await
            .unwrap();
        assert!(h.mailer.last_token_for("reset").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_account_revokes_sessions() {
        let h = harness();
        let payload = register_default(&h).await;

        let err = h
            .service
            .delete_account(payload.user.id, "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);

        h.service
            .delete_account(payload.user.id, "spool-weight")
            .await
            .unwrap();

        let err = h
            .manager
            .refresh(&payload.tokens.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionNotFound);
        let err = h
            .service
            .login("maker@example.com", "spool-weight", SessionMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let h = harness();
        let payload = register_default(&h).await;

        let err = h
            .service
            .change_password(payload.user.id, "wrong", "new-password")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);

        h.service
            .change_password(payload.user.id, "spool-weight", "new-password")
            .await
            .unwrap();
        h.service
            .login("maker@example.com", "new-password", SessionMetadata::default())
            .await
            .unwrap();
    }

    #[test]
    fn test_opaque_tokens_are_hex_and_unique() {
        let first = generate_opaque_token();
        let second = generate_opaque_token();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}

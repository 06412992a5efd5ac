//! Session store trait.

use async_trait::async_trait;
use uuid::Uuid;

use printquote_core::result::AppResult;

use super::model::{CreateSession, Session, SessionIdentity};

/// Persistence boundary for refresh-token sessions.
///
/// The storage engine is an implementation detail; the contract is one
/// row per exact token value, many rows per user. Operations that match
/// zero rows report that through their return value rather than an
/// error — the session manager decides which zero-row outcomes are
/// domain failures.
#[async_trait]
pub trait SessionRepo: Send + Sync + 'static {
    /// Insert a new session row.
    async fn create(&self, session: &CreateSession) -> AppResult<Session>;

    /// Find the unexpired session holding the exact token value, joined
    /// with its owner's identity.
    async fn find_valid_by_token(&self, refresh_token: &str)
    -> AppResult<Option<SessionIdentity>>;

    /// List a user's unexpired sessions, newest first.
    async fn find_valid_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>>;

    /// Atomically replace `old_token`'s row with a successor session.
    ///
    /// Delete-old and insert-new run in one transaction. When the delete
    /// matches zero rows, nothing is inserted and `None` is returned:
    /// the token was already rotated, revoked, or never issued. This is
    /// what makes a refresh token single-use under concurrency.
    async fn replace(
        &self,
        old_token: &str,
        successor: &CreateSession,
    ) -> AppResult<Option<Session>>;

    /// Delete the session holding the exact token value. Returns the
    /// number of rows removed; zero is not an error.
    async fn delete_by_token(&self, refresh_token: &str) -> AppResult<u64>;

    /// Delete every session belonging to the user.
    async fn delete_all_by_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete every session belonging to the user except the one holding
    /// `current_token`.
    async fn delete_all_except(&self, user_id: Uuid, current_token: &str) -> AppResult<u64>;

    /// Delete the user's oldest sessions so that at most `keep` remain,
    /// judged by creation time.
    async fn prune_oldest(&self, user_id: Uuid, keep: u32) -> AppResult<u64>;

    /// Delete every session whose expiry has elapsed.
    async fn delete_expired(&self) -> AppResult<u64>;
}

//! In-memory session store for single-node use and test doubles.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use printquote_core::result::AppResult;
use printquote_entity::session::model::{CreateSession, Session, SessionIdentity};
use printquote_entity::session::repo::SessionRepo;
use printquote_entity::user::UserProfile;

/// Internal state for the memory-based session store.
#[derive(Debug, Default)]
struct InnerState {
    /// Session rows in insertion (creation) order.
    sessions: Vec<Session>,
    /// Known user identities for the valid-token join.
    users: HashMap<Uuid, UserProfile>,
}

/// In-memory session store using a Tokio mutex for thread safety.
///
/// All multi-step operations run under one lock acquisition, giving the
/// same atomicity the Postgres store gets from transactions.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionRepo {
    /// Protected inner state.
    state: Arc<Mutex<InnerState>>,
}

impl MemorySessionRepo {
    /// Creates an empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user identity so valid-token lookups can join it.
    pub async fn insert_user(&self, user: UserProfile) {
        self.state.lock().await.users.insert(user.id, user);
    }

    /// Number of stored sessions for a user, expired rows included.
    pub async fn session_count(&self, user_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    /// Overrides a stored row's expiry. Test hook for expiry behavior.
    pub async fn force_expiry(&self, refresh_token: &str, expires_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(session) = state
            .sessions
            .iter_mut()
            .find(|s| s.refresh_token == refresh_token)
        {
            session.expires_at = expires_at;
        }
    }

    fn materialize(create: &CreateSession) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: create.user_id,
            refresh_token: create.refresh_token.clone(),
            fingerprint: create.fingerprint.clone(),
            user_agent: create.user_agent.clone(),
            ip_address: create.ip_address.clone(),
            expires_at: create.expires_at,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SessionRepo for MemorySessionRepo {
    async fn create(&self, session: &CreateSession) -> AppResult<Session> {
        let mut state = self.state.lock().await;
        let row = Self::materialize(session);
        state.sessions.push(row.clone());
        Ok(row)
    }

    async fn find_valid_by_token(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<SessionIdentity>> {
        let state = self.state.lock().await;
        let now = Utc::now();
        let found = state
            .sessions
            .iter()
            .find(|s| s.refresh_token == refresh_token && s.expires_at > now);

        Ok(found.and_then(|session| {
            state.users.get(&session.user_id).map(|user| SessionIdentity {
                session: session.clone(),
                user: user.clone(),
            })
        }))
    }

    async fn find_valid_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        let state = self.state.lock().await;
        let now = Utc::now();
        // Newest first; insertion order stands in for creation time.
        Ok(state
            .sessions
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id && s.expires_at > now)
            .cloned()
            .collect())
    }

    async fn replace(
        &self,
        old_token: &str,
        successor: &CreateSession,
    ) -> AppResult<Option<Session>> {
        let mut state = self.state.lock().await;
        let Some(index) = state
            .sessions
            .iter()
            .position(|s| s.refresh_token == old_token)
        else {
            return Ok(None);
        };
        state.sessions.remove(index);

        let row = Self::materialize(successor);
        state.sessions.push(row.clone());
        Ok(Some(row))
    }

    async fn delete_by_token(&self, refresh_token: &str) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.refresh_token != refresh_token);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_all_by_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.user_id != user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_all_except(&self, user_id: Uuid, current_token: &str) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state
            .sessions
            .retain(|s| s.user_id != user_id || s.refresh_token == current_token);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn prune_oldest(&self, user_id: Uuid, keep: u32) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let owned: Vec<Uuid> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.id)
            .collect();

        if owned.len() <= keep as usize {
            return Ok(0);
        }

        let doomed: Vec<Uuid> = owned[..owned.len() - keep as usize].to_vec();
        state.sessions.retain(|s| !doomed.contains(&s.id));
        Ok(doomed.len() as u64)
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

//! Expired session sweeping.

use std::sync::Arc;

use tracing::{error, info};

use printquote_core::result::AppResult;

use super::manager::SessionManager;

/// Drives the expired-session sweep on behalf of the server binary.
///
/// The sweep runs on an operator-triggered or periodic schedule, never
/// on the request path.
#[derive(Clone)]
pub struct SessionSweeper {
    /// Session manager performing the deletion.
    manager: Arc<SessionManager>,
}

impl std::fmt::Debug for SessionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSweeper").finish()
    }
}

impl SessionSweeper {
    /// Creates a new sweeper.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Runs one sweep cycle, returning the number of rows removed.
    pub async fn run_sweep(&self) -> AppResult<u64> {
        let removed = self.manager.sweep_expired().await?;
        if removed > 0 {
            info!(removed = removed, "Sweep cycle completed");
        }
        Ok(removed)
    }

    /// Runs one sweep cycle, logging instead of propagating failures.
    ///
    /// A failed sweep is retried on the next tick; it must not take the
    /// periodic task down.
    pub async fn run_sweep_logged(&self) {
        if let Err(e) = self.run_sweep().await {
            error!(error = %e, "Session sweep failed");
        }
    }
}

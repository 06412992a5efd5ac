//! Session lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum concurrent refresh-token sessions per user. Issuing a
    /// session beyond this cap silently evicts the oldest ones.
    #[serde(default = "default_max_sessions")]
    pub max_sessions_per_user: u32,
    /// Interval for the expired session sweep in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_user: default_max_sessions(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

fn default_max_sessions() -> u32 {
    5
}

fn default_sweep_interval() -> u64 {
    15
}

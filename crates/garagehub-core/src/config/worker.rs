//! Background maintenance worker configuration.

use serde::{Deserialize, Serialize};

/// Background maintenance worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the maintenance worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in minutes between login-attempt purge runs.
    #[serde(default = "default_attempt_purge_interval")]
    pub attempt_purge_interval_minutes: u64,
    /// Interval in minutes between refresh-token cleanup runs.
    #[serde(default = "default_token_cleanup_interval")]
    pub token_cleanup_interval_minutes: u64,
    /// Retention for revoked/expired refresh tokens, in days.
    #[serde(default = "default_token_retention")]
    pub token_retention_days: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attempt_purge_interval_minutes: default_attempt_purge_interval(),
            token_cleanup_interval_minutes: default_token_cleanup_interval(),
            token_retention_days: default_token_retention(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_attempt_purge_interval() -> u64 {
    1440
}

fn default_token_cleanup_interval() -> u64 {
    60
}

fn default_token_retention() -> u64 {
    7
}

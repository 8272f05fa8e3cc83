//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
///
/// Lockout policy (`max_attempts`, `lockout_window_minutes`,
/// `lock_duration_minutes`) is configuration, not code: operators tune it
/// per deployment without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256). Must be at least 32 bytes;
    /// startup fails otherwise.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,
    /// Standard refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Remember-me refresh token TTL in days.
    #[serde(default = "default_remember_me_ttl")]
    pub remember_me_ttl_days: u64,
    /// Maximum failed login attempts within the window before lockout.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Trailing window over which failed attempts are counted, in minutes.
    #[serde(default = "default_lockout_window")]
    pub lockout_window_minutes: u64,
    /// Account lock duration in minutes once the threshold is reached.
    #[serde(default = "default_lock_duration")]
    pub lock_duration_minutes: u64,
    /// Retention for login attempt records, in days.
    #[serde(default = "default_attempt_retention")]
    pub attempt_retention_days: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_ttl_seconds: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            remember_me_ttl_days: default_remember_me_ttl(),
            max_attempts: default_max_attempts(),
            lockout_window_minutes: default_lockout_window(),
            lock_duration_minutes: default_lock_duration(),
            attempt_retention_days: default_attempt_retention(),
        }
    }
}

fn default_jwt_secret() -> String {
    // Fails the minimum-length check at startup; forces operators to set one.
    String::new()
}

fn default_access_ttl() -> u64 {
    900
}

fn default_refresh_ttl() -> u64 {
    24
}

fn default_remember_me_ttl() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout_window() -> u64 {
    30
}

fn default_lock_duration() -> u64 {
    15
}

fn default_attempt_retention() -> u64 {
    30
}

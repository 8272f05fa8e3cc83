//! Login attempt entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum stored length for a client user-agent string.
pub const MAX_USER_AGENT_LEN: usize = 255;

/// Immutable record of one authentication attempt.
///
/// Append-only: never mutated after creation. Recorded for every login call,
/// including attempts against emails that do not resolve to an account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginAttempt {
    /// Unique record identifier.
    pub id: Uuid,
    /// Email exactly as entered, not resolved to an identity.
    pub email: String,
    /// Origin IP of the client.
    pub origin_ip: String,
    /// Client user-agent, truncated to [`MAX_USER_AGENT_LEN`].
    pub user_agent: Option<String>,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Failure reason, present only when `success` is false.
    pub failure_reason: Option<String>,
    /// When the attempt happened.
    pub attempted_at: DateTime<Utc>,
}

/// Data required to append a new attempt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoginAttempt {
    /// Email as entered.
    pub email: String,
    /// Origin IP.
    pub origin_ip: String,
    /// Client user-agent (will be truncated).
    pub user_agent: Option<String>,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Failure reason for failed attempts.
    pub failure_reason: Option<String>,
}

impl NewLoginAttempt {
    /// Build a failure record.
    pub fn failure(
        email: impl Into<String>,
        origin_ip: impl Into<String>,
        user_agent: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            origin_ip: origin_ip.into(),
            user_agent: user_agent.map(truncate_user_agent),
            success: false,
            failure_reason: Some(reason.into()),
        }
    }

    /// Build a success record.
    pub fn success(
        email: impl Into<String>,
        origin_ip: impl Into<String>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            email: email.into(),
            origin_ip: origin_ip.into(),
            user_agent: user_agent.map(truncate_user_agent),
            success: true,
            failure_reason: None,
        }
    }
}

fn truncate_user_agent(ua: &str) -> String {
    if ua.len() <= MAX_USER_AGENT_LEN {
        ua.to_string()
    } else {
        let mut end = MAX_USER_AGENT_LEN;
        while !ua.is_char_boundary(end) {
            end -= 1;
        }
        ua[..end].to_string()
    }
}

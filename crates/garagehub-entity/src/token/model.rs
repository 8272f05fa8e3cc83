//! Refresh token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::TokenStatus;

/// A long-lived capability to obtain a new access token without re-entering
/// credentials.
///
/// Only the SHA-256 digest of the opaque token string is stored; the
/// plaintext token exists solely in the client's hands.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Unique record identifier.
    pub id: Uuid,
    /// SHA-256 digest (hex) of the opaque token string.
    pub token_hash: String,
    /// Owner of the token.
    pub user_id: Uuid,
    /// Current state.
    pub status: TokenStatus,
    /// Whether the token was issued with remember-me (extended TTL).
    pub remember_me: bool,
    /// Origin IP at issuance.
    pub origin_ip: String,
    /// Client user-agent at issuance.
    pub user_agent: Option<String>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// When the token left the Active state, if it has.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// A token is valid iff it is Active and unexpired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == TokenStatus::Active && now < self.expires_at
    }

    /// A token is valid iff it is Active and unexpired.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Data required to insert a new refresh token record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRefreshToken {
    /// SHA-256 digest (hex) of the opaque token string.
    pub token_hash: String,
    /// Owner of the token.
    pub user_id: Uuid,
    /// Remember-me flag.
    pub remember_me: bool,
    /// Origin IP.
    pub origin_ip: String,
    /// Client user-agent.
    pub user_agent: Option<String>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

//! Refresh token status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a refresh token.
///
/// `Active -> {Rotated, Revoked, Expired}`; everything after `Active` is
/// terminal. A token is live only while `Active` and before its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    /// Live and exchangeable for a new token pair.
    Active,
    /// Consumed by a rotation; a replacement was issued.
    Rotated,
    /// Revoked by logout, reuse detection, or an administrator.
    Revoked,
    /// Marked expired by the cleanup job.
    Expired,
}

impl TokenStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Rotated => "rotated",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// An account capable of authenticating against GarageHub.
///
/// Lockout fields (`failed_login_attempts`, `locked_until`) are mutated by
/// the lockout guard; last-login fields by the login orchestrator. Accounts
/// are never physically deleted by the auth core.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address, unique case-insensitively across the store.
    pub email: String,
    /// Argon2 password digest.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Assigned roles. Always at least one.
    pub roles: Vec<UserRole>,
    /// Whether the account may authenticate at all.
    pub enabled: bool,
    /// Consecutive failed login attempts within the lockout window.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Origin IP of the last successful login.
    pub last_login_ip: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is currently locked.
    ///
    /// A non-null `locked_until` counts only while it is in the future.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    /// Check if the account is currently locked.
    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    /// Check if this user has any of the given roles.
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(UserRole::is_admin)
    }
}

//! Storage seams consumed by the authentication core.
//!
//! The core talks to three stores through traits so that the orchestrator,
//! lockout guard, and rotation protocol are testable without a database:
//! Postgres adapters wrap the `garagehub-database` repositories, and the
//! `memory` adapters back tests and single-process tools.
//!
//! All operations are I/O and fallible; callers treat errors as
//! [`TransientFailure`](crate::AuthError::Transient) and fail closed.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use garagehub_core::result::AppResult;
use garagehub_entity::attempt::{LoginAttempt, NewLoginAttempt};
use garagehub_entity::token::{NewRefreshToken, RefreshToken};
use garagehub_entity::user::User;

pub use memory::{MemoryAttemptLedger, MemoryIdentityStore, MemoryRefreshTokenStore};
pub use postgres::{PgAttemptLedger, PgIdentityStore, PgRefreshTokenStore};

/// Holds user credentials and lockout state.
///
/// Read-mostly from this core's perspective; the only writes are the
/// narrow, idempotent lockout and last-login updates.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find an identity by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find an identity by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Set the failure counter. Last-writer-wins is acceptable.
    async fn set_failed_attempts(&self, user_id: Uuid, count: i32) -> AppResult<()>;

    /// Lock the account until the given time, storing the triggering count.
    async fn lock_until(&self, user_id: Uuid, count: i32, until: DateTime<Utc>) -> AppResult<()>;

    /// Clear lock fields and zero the failure counter. Idempotent.
    async fn clear_lockout(&self, user_id: Uuid) -> AppResult<()>;

    /// Record a successful login's timestamp and origin.
    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
        origin_ip: &str,
    ) -> AppResult<()>;
}

/// Append-only record of login attempts.
///
/// Attempts are recorded for every email, including ones that resolve to
/// no account, so probing unknown addresses still counts toward abuse
/// detection without revealing which emails exist.
#[async_trait]
pub trait AttemptLedger: Send + Sync {
    /// Append one attempt record.
    async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt>;

    /// Count failed attempts for an email since the given instant.
    async fn count_failures_since(&self, email: &str, since: DateTime<Utc>) -> AppResult<u32>;

    /// Delete records older than the cutoff. Runs off the request path.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Persists refresh tokens and performs their state transitions.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a new Active token record.
    async fn insert(&self, token: &NewRefreshToken) -> AppResult<RefreshToken>;

    /// Find a token record by digest, in any state.
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;

    /// Atomic compare-and-swap Active→Rotated. Returns the row if this
    /// caller won the transition, `None` otherwise.
    async fn mark_rotated_if_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshToken>>;

    /// Revoke one token by digest. Idempotent.
    async fn revoke_by_hash(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every Active token owned by the user.
    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Expire stale Active tokens and delete dead rows past retention.
    async fn cleanup(&self, now: DateTime<Utc>, retain_until: DateTime<Utc>) -> AppResult<u64>;
}

//! Postgres adapters wrapping the database repositories.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use garagehub_core::result::AppResult;
use garagehub_database::repositories::{
    LoginAttemptRepository, RefreshTokenRepository, UserRepository,
};
use garagehub_entity::attempt::{LoginAttempt, NewLoginAttempt};
use garagehub_entity::token::{NewRefreshToken, RefreshToken};
use garagehub_entity::user::User;

use super::{AttemptLedger, IdentityStore, RefreshTokenStore};

/// Identity store backed by the users table.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    repo: Arc<UserRepository>,
}

impl PgIdentityStore {
    /// Create a new Postgres identity store.
    pub fn new(repo: Arc<UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.repo.find_by_email(email).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.repo.find_by_id(id).await
    }

    async fn set_failed_attempts(&self, user_id: Uuid, count: i32) -> AppResult<()> {
        self.repo.set_failed_attempts(user_id, count).await
    }

    async fn lock_until(&self, user_id: Uuid, count: i32, until: DateTime<Utc>) -> AppResult<()> {
        self.repo.lock_until(user_id, count, until).await
    }

    async fn clear_lockout(&self, user_id: Uuid) -> AppResult<()> {
        self.repo.clear_lockout(user_id).await
    }

    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
        origin_ip: &str,
    ) -> AppResult<()> {
        self.repo.update_last_login(user_id, at, origin_ip).await
    }
}

/// Attempt ledger backed by the login_attempts table.
#[derive(Debug, Clone)]
pub struct PgAttemptLedger {
    repo: Arc<LoginAttemptRepository>,
}

impl PgAttemptLedger {
    /// Create a new Postgres attempt ledger.
    pub fn new(repo: Arc<LoginAttemptRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AttemptLedger for PgAttemptLedger {
    async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt> {
        self.repo.insert(attempt).await
    }

    async fn count_failures_since(&self, email: &str, since: DateTime<Utc>) -> AppResult<u32> {
        self.repo.count_failures_since(email, since).await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        self.repo.purge_older_than(cutoff).await
    }
}

/// Refresh token store backed by the refresh_tokens table.
///
/// The Active→Rotated transition is a conditional UPDATE against the
/// unique token digest, so concurrent rotations of the same token are
/// serialized by the database.
#[derive(Debug, Clone)]
pub struct PgRefreshTokenStore {
    repo: Arc<RefreshTokenRepository>,
}

impl PgRefreshTokenStore {
    /// Create a new Postgres refresh token store.
    pub fn new(repo: Arc<RefreshTokenRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(&self, token: &NewRefreshToken) -> AppResult<RefreshToken> {
        self.repo.insert(token).await
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        self.repo.find_by_hash(token_hash).await
    }

    async fn mark_rotated_if_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshToken>> {
        self.repo.mark_rotated_if_active(token_hash, now).await
    }

    async fn revoke_by_hash(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        self.repo.revoke_by_hash(token_hash, now).await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        self.repo.revoke_all_for_user(user_id, now).await
    }

    async fn cleanup(&self, now: DateTime<Utc>, retain_until: DateTime<Utc>) -> AppResult<u64> {
        self.repo.cleanup(now, retain_until).await
    }
}

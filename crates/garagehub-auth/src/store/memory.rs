//! In-memory store adapters.
//!
//! Back the test suites and single-process tooling. State lives behind a
//! `tokio::sync::Mutex`, so every trait method sees a consistent snapshot
//! and the Active→Rotated transition is a true compare-and-swap.
//!
//! The `*_for_test` helpers mutate state directly (backdating attempts,
//! shortening expiries, clearing locks) to simulate the passage of time
//! without a controllable clock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use garagehub_core::result::AppResult;
use garagehub_entity::attempt::{LoginAttempt, NewLoginAttempt};
use garagehub_entity::token::{NewRefreshToken, RefreshToken, TokenStatus};
use garagehub_entity::user::User;

use super::{AttemptLedger, IdentityStore, RefreshTokenStore};

/// Identity store holding users in a map keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn upsert(&self, user: User) {
        self.users.lock().await.insert(user.id, user);
    }

    /// Apply an arbitrary mutation to a stored user.
    pub async fn mutate_for_test(&self, user_id: Uuid, f: impl FnOnce(&mut User)) {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            f(user);
        }
    }

    /// Read a snapshot of a stored user.
    pub async fn snapshot(&self, user_id: Uuid) -> Option<User> {
        self.users.lock().await.get(&user_id).cloned()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn set_failed_attempts(&self, user_id: Uuid, count: i32) -> AppResult<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.failed_login_attempts = count;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn lock_until(&self, user_id: Uuid, count: i32, until: DateTime<Utc>) -> AppResult<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.failed_login_attempts = count;
            user.locked_until = Some(until);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn clear_lockout(&self, user_id: Uuid) -> AppResult<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.failed_login_attempts = 0;
            user.locked_until = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
        origin_ip: &str,
    ) -> AppResult<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.last_login_at = Some(at);
            user.last_login_ip = Some(origin_ip.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Attempt ledger holding records in an append-only vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttemptLedger {
    attempts: Arc<Mutex<Vec<LoginAttempt>>>,
}

impl MemoryAttemptLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt with an explicit timestamp.
    pub async fn record_at_for_test(
        &self,
        attempt: &NewLoginAttempt,
        attempted_at: DateTime<Utc>,
    ) -> LoginAttempt {
        let record = LoginAttempt {
            id: Uuid::new_v4(),
            email: attempt.email.clone(),
            origin_ip: attempt.origin_ip.clone(),
            user_agent: attempt.user_agent.clone(),
            success: attempt.success,
            failure_reason: attempt.failure_reason.clone(),
            attempted_at,
        };
        self.attempts.lock().await.push(record.clone());
        record
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.attempts.lock().await.len()
    }

    /// Whether the ledger holds no records.
    pub async fn is_empty(&self) -> bool {
        self.attempts.lock().await.is_empty()
    }
}

#[async_trait]
impl AttemptLedger for MemoryAttemptLedger {
    async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt> {
        Ok(self.record_at_for_test(attempt, Utc::now()).await)
    }

    async fn count_failures_since(&self, email: &str, since: DateTime<Utc>) -> AppResult<u32> {
        let attempts = self.attempts.lock().await;
        let count = attempts
            .iter()
            .filter(|a| {
                !a.success && a.attempted_at >= since && a.email.eq_ignore_ascii_case(email)
            })
            .count();
        Ok(count as u32)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut attempts = self.attempts.lock().await;
        let before = attempts.len();
        attempts.retain(|a| a.attempted_at >= cutoff);
        Ok((before - attempts.len()) as u64)
    }
}

/// Refresh token store keyed by token digest.
#[derive(Debug, Clone, Default)]
pub struct MemoryRefreshTokenStore {
    tokens: Arc<Mutex<HashMap<String, RefreshToken>>>,
}

impl MemoryRefreshTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an arbitrary mutation to a stored token record.
    pub async fn mutate_for_test(&self, token_hash: &str, f: impl FnOnce(&mut RefreshToken)) {
        if let Some(token) = self.tokens.lock().await.get_mut(token_hash) {
            f(token);
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.tokens.lock().await.len()
    }

    /// Count of Active records for a user.
    pub async fn active_count_for(&self, user_id: Uuid) -> usize {
        let tokens = self.tokens.lock().await;
        tokens
            .values()
            .filter(|t| t.user_id == user_id && t.status == TokenStatus::Active)
            .count()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn insert(&self, token: &NewRefreshToken) -> AppResult<RefreshToken> {
        let record = RefreshToken {
            id: Uuid::new_v4(),
            token_hash: token.token_hash.clone(),
            user_id: token.user_id,
            status: TokenStatus::Active,
            remember_me: token.remember_me,
            origin_ip: token.origin_ip.clone(),
            user_agent: token.user_agent.clone(),
            created_at: Utc::now(),
            expires_at: token.expires_at,
            revoked_at: None,
        };
        self.tokens
            .lock()
            .await
            .insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self.tokens.lock().await.get(token_hash).cloned())
    }

    async fn mark_rotated_if_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshToken>> {
        let mut tokens = self.tokens.lock().await;
        match tokens.get_mut(token_hash) {
            Some(token) if token.status == TokenStatus::Active => {
                token.status = TokenStatus::Rotated;
                token.revoked_at = Some(now);
                Ok(Some(token.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_by_hash(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tokens = self.tokens.lock().await;
        match tokens.get_mut(token_hash) {
            Some(token) if token.status == TokenStatus::Active => {
                token.status = TokenStatus::Revoked;
                token.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.tokens.lock().await;
        let mut revoked = 0u64;
        for token in tokens.values_mut() {
            if token.user_id == user_id && token.status == TokenStatus::Active {
                token.status = TokenStatus::Revoked;
                token.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn cleanup(&self, now: DateTime<Utc>, retain_until: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.tokens.lock().await;
        let mut touched = 0u64;
        for token in tokens.values_mut() {
            if token.status == TokenStatus::Active && token.expires_at <= now {
                token.status = TokenStatus::Expired;
                token.revoked_at = Some(now);
                touched += 1;
            }
        }
        let before = tokens.len();
        tokens.retain(|_, t| {
            t.status == TokenStatus::Active
                || t.revoked_at.map(|at| at >= retain_until).unwrap_or(true)
        });
        touched += (before - tokens.len()) as u64;
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_token(user_id: Uuid, digest: &str) -> NewRefreshToken {
        NewRefreshToken {
            token_hash: digest.to_string(),
            user_id,
            remember_me: false,
            origin_ip: "10.0.0.1".to_string(),
            user_agent: None,
            expires_at: Utc::now() + Duration::hours(24),
        }
    }

    #[tokio::test]
    async fn test_cas_rotation_single_winner() {
        let store = MemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        store.insert(&new_token(user_id, "d1")).await.unwrap();

        let now = Utc::now();
        let first = store.mark_rotated_if_active("d1", now).await.unwrap();
        let second = store.mark_rotated_if_active("d1", now).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_owner() {
        let store = MemoryRefreshTokenStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(&new_token(owner, "d1")).await.unwrap();
        store.insert(&new_token(owner, "d2")).await.unwrap();
        store.insert(&new_token(other, "d3")).await.unwrap();

        let revoked = store.revoke_all_for_user(owner, Utc::now()).await.unwrap();

        assert_eq!(revoked, 2);
        assert_eq!(store.active_count_for(other).await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_expires_and_prunes() {
        let store = MemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        store.insert(&new_token(user_id, "stale")).await.unwrap();
        store
            .mutate_for_test("stale", |t| {
                t.expires_at = Utc::now() - Duration::hours(1);
            })
            .await;

        let now = Utc::now();
        let touched = store.cleanup(now, now - Duration::days(7)).await.unwrap();
        assert_eq!(touched, 1);

        let record = store.find_by_hash("stale").await.unwrap().unwrap();
        assert_eq!(record.status, TokenStatus::Expired);

        // A second pass with retention in the future deletes the dead row.
        store.cleanup(now, now + Duration::hours(1)).await.unwrap();
        assert!(store.find_by_hash("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_window_counting() {
        let ledger = MemoryAttemptLedger::new();
        let now = Utc::now();
        for minutes_ago in [1, 5, 90] {
            ledger
                .record_at_for_test(
                    &NewLoginAttempt::failure("a@b.com", "10.0.0.1", None, "bad password"),
                    now - Duration::minutes(minutes_ago),
                )
                .await;
        }
        ledger
            .record(&NewLoginAttempt::success("a@b.com", "10.0.0.1", None))
            .await
            .unwrap();

        let count = ledger
            .count_failures_since("A@B.com", now - Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}

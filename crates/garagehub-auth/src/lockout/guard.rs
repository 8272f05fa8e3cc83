//! Lockout guard implementation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use garagehub_core::config::auth::AuthConfig;
use garagehub_core::result::AppResult;
use garagehub_entity::attempt::NewLoginAttempt;
use garagehub_entity::user::User;

use crate::session::ClientMeta;
use crate::store::{AttemptLedger, IdentityStore};

/// Tunable lockout thresholds, derived from [`AuthConfig`].
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Failures within the window that trigger a lock.
    pub max_attempts: u32,
    /// Trailing window over which failures are counted.
    pub window: Duration,
    /// How long a triggered lock lasts.
    pub lock_duration: Duration,
}

impl LockoutPolicy {
    /// Build a policy from configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: Duration::minutes(config.lockout_window_minutes as i64),
            lock_duration: Duration::minutes(config.lock_duration_minutes as i64),
        }
    }
}

/// Decides, per attempt, whether an identity may proceed to credential
/// verification, and maintains lock state as failures accrue.
///
/// Failures are counted from the ledger over a trailing window, so the
/// count survives process restarts and is shared across instances. The
/// per-user counter column is advisory display state only.
pub struct LockoutGuard {
    identities: Arc<dyn IdentityStore>,
    ledger: Arc<dyn AttemptLedger>,
    policy: LockoutPolicy,
}

impl LockoutGuard {
    /// Create a guard over the given stores.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        ledger: Arc<dyn AttemptLedger>,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            identities,
            ledger,
            policy,
        }
    }

    /// The active policy.
    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// If the user is locked at `now`, returns the remaining lock time in
    /// seconds (rounded up, at least 1).
    pub fn retry_after(&self, user: &User, now: DateTime<Utc>) -> Option<u64> {
        let until = user.locked_until?;
        if until <= now {
            return None;
        }
        let millis = (until - now).num_milliseconds().max(0) as u64;
        Some(millis.div_ceil(1000).max(1))
    }

    /// Clears an expired lock so a correct login can proceed immediately
    /// after the lock window passes.
    pub async fn auto_unlock_if_expired(&self, user: &User, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(until) = user.locked_until {
            if until <= now {
                self.identities.clear_lockout(user.id).await?;
            }
        }
        Ok(())
    }

    /// Records a failed attempt and locks the account if the failure count
    /// within the window reaches the threshold.
    ///
    /// Returns the lock expiry when this failure triggered (or extended)
    /// a lock. Attempts against unknown emails are recorded but can never
    /// lock anything.
    pub async fn record_failure(
        &self,
        email: &str,
        user: Option<&User>,
        meta: &ClientMeta,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DateTime<Utc>>> {
        self.ledger
            .record(&NewLoginAttempt::failure(
                email,
                meta.origin_ip.clone(),
                meta.user_agent.as_deref(),
                reason,
            ))
            .await?;

        let count = self
            .ledger
            .count_failures_since(email, now - self.policy.window)
            .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        if count >= self.policy.max_attempts {
            let until = now + self.policy.lock_duration;
            self.identities
                .lock_until(user.id, count as i32, until)
                .await?;
            warn!(
                user_id = %user.id,
                failures = count,
                locked_until = %until,
                "account locked after repeated login failures"
            );
            Ok(Some(until))
        } else {
            self.identities
                .set_failed_attempts(user.id, count as i32)
                .await?;
            Ok(None)
        }
    }

    /// Deletes ledger records older than the cutoff.
    pub async fn purge_attempts_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        self.ledger.purge_older_than(cutoff).await
    }

    /// Records a successful attempt and resets lock state.
    pub async fn record_success(
        &self,
        user_id: Uuid,
        email: &str,
        meta: &ClientMeta,
    ) -> AppResult<()> {
        self.ledger
            .record(&NewLoginAttempt::success(
                email,
                meta.origin_ip.clone(),
                meta.user_agent.as_deref(),
            ))
            .await?;
        self.identities.clear_lockout(user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryAttemptLedger, MemoryIdentityStore};
    use garagehub_entity::user::UserRole;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::from_config(&AuthConfig::default())
    }

    fn test_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: String::new(),
            display_name: None,
            roles: vec![UserRole::Advisor],
            enabled: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            last_login_ip: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn meta() -> ClientMeta {
        ClientMeta {
            origin_ip: "10.0.0.1".to_string(),
            user_agent: Some("test-suite".to_string()),
        }
    }

    fn guard(
        identities: Arc<MemoryIdentityStore>,
        ledger: Arc<MemoryAttemptLedger>,
    ) -> LockoutGuard {
        LockoutGuard::new(identities, ledger, policy())
    }

    #[tokio::test]
    async fn test_lock_triggers_at_threshold() {
        let identities = Arc::new(MemoryIdentityStore::new());
        let ledger = Arc::new(MemoryAttemptLedger::new());
        let user = test_user("a@b.com");
        identities.upsert(user.clone()).await;
        let guard = guard(identities.clone(), ledger);

        let now = Utc::now();
        for i in 1..=5 {
            let locked = guard
                .record_failure("a@b.com", Some(&user), &meta(), "bad password", now)
                .await
                .unwrap();
            if i < 5 {
                assert!(locked.is_none(), "locked too early at attempt {i}");
            } else {
                assert!(locked.is_some(), "not locked at attempt {i}");
            }
        }

        let stored = identities.snapshot(user.id).await.unwrap();
        let retry = guard.retry_after(&stored, now).unwrap();
        assert!(retry > 890 && retry <= 900, "retry_after was {retry}");
    }

    #[tokio::test]
    async fn test_failures_outside_window_do_not_count() {
        let identities = Arc::new(MemoryIdentityStore::new());
        let ledger = Arc::new(MemoryAttemptLedger::new());
        let user = test_user("a@b.com");
        identities.upsert(user.clone()).await;

        let now = Utc::now();
        // Four stale failures well outside the 30 minute window.
        for _ in 0..4 {
            ledger
                .record_at_for_test(
                    &NewLoginAttempt::failure("a@b.com", "10.0.0.1", None, "bad password"),
                    now - Duration::hours(2),
                )
                .await;
        }

        let guard = guard(identities.clone(), ledger);
        let locked = guard
            .record_failure("a@b.com", Some(&user), &meta(), "bad password", now)
            .await
            .unwrap();

        assert!(locked.is_none());
        assert_eq!(
            identities
                .snapshot(user.id)
                .await
                .unwrap()
                .failed_login_attempts,
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_email_is_recorded_but_never_locks() {
        let identities = Arc::new(MemoryIdentityStore::new());
        let ledger = Arc::new(MemoryAttemptLedger::new());
        let guard = guard(identities, ledger.clone());

        let now = Utc::now();
        for _ in 0..10 {
            let locked = guard
                .record_failure("ghost@b.com", None, &meta(), "unknown email", now)
                .await
                .unwrap();
            assert!(locked.is_none());
        }
        assert_eq!(ledger.len().await, 10);
    }

    #[tokio::test]
    async fn test_expired_lock_auto_unlocks() {
        let identities = Arc::new(MemoryIdentityStore::new());
        let ledger = Arc::new(MemoryAttemptLedger::new());
        let mut user = test_user("a@b.com");
        user.locked_until = Some(Utc::now() - Duration::minutes(1));
        user.failed_login_attempts = 5;
        identities.upsert(user.clone()).await;
        let guard = guard(identities.clone(), ledger);

        let now = Utc::now();
        assert!(guard.retry_after(&user, now).is_none());
        guard.auto_unlock_if_expired(&user, now).await.unwrap();

        let stored = identities.snapshot(user.id).await.unwrap();
        assert!(stored.locked_until.is_none());
        assert_eq!(stored.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_success_clears_counter() {
        let identities = Arc::new(MemoryIdentityStore::new());
        let ledger = Arc::new(MemoryAttemptLedger::new());
        let mut user = test_user("a@b.com");
        user.failed_login_attempts = 3;
        identities.upsert(user.clone()).await;
        let guard = guard(identities.clone(), ledger);

        guard
            .record_success(user.id, "a@b.com", &meta())
            .await
            .unwrap();

        let stored = identities.snapshot(user.id).await.unwrap();
        assert_eq!(stored.failed_login_attempts, 0);
    }
}

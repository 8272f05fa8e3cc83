//! End-to-end lockout behavior through the login orchestrator.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use garagehub_auth::error::AuthError;
use garagehub_auth::lockout::{LockoutGuard, LockoutPolicy};
use garagehub_auth::password::PasswordHasher;
use garagehub_auth::session::{ClientMeta, LoginOrchestrator, RotationProtocol};
use garagehub_auth::store::{
    MemoryAttemptLedger, MemoryIdentityStore, MemoryRefreshTokenStore,
};
use garagehub_auth::token::TokenIssuer;
use garagehub_core::config::auth::AuthConfig;
use garagehub_entity::user::{User, UserRole};

struct Harness {
    identities: Arc<MemoryIdentityStore>,
    orchestrator: LoginOrchestrator,
}

fn harness() -> Harness {
    let config = AuthConfig {
        jwt_secret: "integration-test-secret-0123456789ab".to_string(),
        ..AuthConfig::default()
    };

    let identities = Arc::new(MemoryIdentityStore::new());
    let ledger = Arc::new(MemoryAttemptLedger::new());
    let tokens = Arc::new(MemoryRefreshTokenStore::new());

    let guard = Arc::new(LockoutGuard::new(
        identities.clone(),
        ledger,
        LockoutPolicy::from_config(&config),
    ));
    let issuer = Arc::new(TokenIssuer::new(&config).expect("issuer"));
    let rotation = Arc::new(RotationProtocol::new(tokens, &config));

    Harness {
        identities: identities.clone(),
        orchestrator: LoginOrchestrator::new(
            identities,
            guard,
            PasswordHasher::new(),
            issuer,
            rotation,
        ),
    }
}

async fn seed(harness: &Harness, email: &str, password: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: PasswordHasher::new().hash_password(password).expect("hash"),
        display_name: None,
        roles: vec![UserRole::Advisor],
        enabled: true,
        failed_login_attempts: 0,
        locked_until: None,
        last_login_at: None,
        last_login_ip: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    harness.identities.upsert(user.clone()).await;
    user
}

fn meta() -> ClientMeta {
    ClientMeta::new("203.0.113.9", Some("integration-test"))
}

/// Five wrong passwords in quick succession lock the account; the next
/// attempt is rejected as locked with roughly the full lock duration
/// remaining, even with the correct password. Once the lock window has
/// passed, the correct password works again.
#[tokio::test]
async fn test_lockout_and_recovery() {
    let harness = harness();
    let user = seed(&harness, "a@b.com", "right-password").await;

    for _ in 0..5 {
        let err = harness
            .orchestrator
            .login("a@b.com", "wrong-password", false, &meta())
            .await
            .expect_err("wrong password must fail");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // Sixth attempt: locked, even with the right password.
    let err = harness
        .orchestrator
        .login("a@b.com", "right-password", false, &meta())
        .await
        .expect_err("locked account must reject");
    match err {
        AuthError::AccountLocked {
            retry_after_seconds,
        } => {
            assert!(
                retry_after_seconds > 870 && retry_after_seconds <= 900,
                "retry_after was {retry_after_seconds}"
            );
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }

    // Simulate the 15 minute lock window passing.
    harness
        .identities
        .mutate_for_test(user.id, |u| {
            u.locked_until = Some(Utc::now() - Duration::seconds(1));
        })
        .await;

    let outcome = harness
        .orchestrator
        .login("a@b.com", "right-password", false, &meta())
        .await
        .expect("login after lock expiry");
    assert_eq!(outcome.user.id, user.id);

    let stored = harness.identities.snapshot(user.id).await.expect("user");
    assert!(stored.locked_until.is_none());
    assert_eq!(stored.failed_login_attempts, 0);
}

/// The lock is keyed to the account, not to the client. A different IP
/// hitting a locked account is still rejected.
#[tokio::test]
async fn test_lock_applies_across_clients() {
    let harness = harness();
    seed(&harness, "a@b.com", "right-password").await;

    for _ in 0..5 {
        let _ = harness
            .orchestrator
            .login("a@b.com", "wrong-password", false, &meta())
            .await;
    }

    let other_client = ClientMeta::new("198.51.100.7", Some("another-device"));
    let err = harness
        .orchestrator
        .login("a@b.com", "right-password", false, &other_client)
        .await
        .expect_err("lock must hold for other clients");
    assert!(matches!(err, AuthError::AccountLocked { .. }));
}

/// Repeated failures against an email with no account never lock anything
/// and always read as bad credentials.
#[tokio::test]
async fn test_unknown_email_never_locks() {
    let harness = harness();

    for _ in 0..8 {
        let err = harness
            .orchestrator
            .login("nobody@b.com", "whatever", false, &meta())
            .await
            .expect_err("unknown email must fail");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}

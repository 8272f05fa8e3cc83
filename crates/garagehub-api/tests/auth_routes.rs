//! Router-level auth flows, driven through `oneshot` requests against the
//! in-memory store adapters. No database required.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use garagehub_api::{build_router, AppState};
use garagehub_auth::lockout::{LockoutGuard, LockoutPolicy};
use garagehub_auth::password::PasswordHasher;
use garagehub_auth::session::{LoginOrchestrator, RotationProtocol};
use garagehub_auth::store::{MemoryAttemptLedger, MemoryIdentityStore, MemoryRefreshTokenStore};
use garagehub_auth::token::TokenIssuer;
use garagehub_core::config::auth::AuthConfig;
use garagehub_core::config::{AppConfig, DatabaseConfig};
use garagehub_entity::user::{User, UserRole};

struct TestApp {
    router: Router,
    identities: Arc<MemoryIdentityStore>,
}

fn test_app() -> TestApp {
    let auth_config = AuthConfig {
        jwt_secret: "router-test-secret-0123456789abcdef".to_string(),
        ..AuthConfig::default()
    };
    let config = AppConfig {
        server: Default::default(),
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_seconds: 1,
            idle_timeout_seconds: 1,
        },
        auth: auth_config.clone(),
        api: Default::default(),
        worker: Default::default(),
        logging: Default::default(),
    };

    let identities = Arc::new(MemoryIdentityStore::new());
    let ledger = Arc::new(MemoryAttemptLedger::new());
    let tokens = Arc::new(MemoryRefreshTokenStore::new());

    let guard = Arc::new(LockoutGuard::new(
        identities.clone(),
        ledger,
        LockoutPolicy::from_config(&auth_config),
    ));
    let issuer = Arc::new(TokenIssuer::new(&auth_config).expect("issuer"));
    let rotation = Arc::new(RotationProtocol::new(tokens, &auth_config));
    let orchestrator = Arc::new(LoginOrchestrator::new(
        identities.clone(),
        guard,
        PasswordHasher::new(),
        issuer.clone(),
        rotation,
    ));

    let state = AppState {
        config: Arc::new(config),
        orchestrator,
        issuer,
        identities: identities.clone(),
    };

    TestApp {
        router: build_router(state),
        identities,
    }
}

async fn seed_user(app: &TestApp, email: &str, password: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: PasswordHasher::new().hash_password(password).expect("hash"),
        display_name: Some("Test Advisor".to_string()),
        roles: vec![UserRole::Advisor],
        enabled: true,
        failed_login_attempts: 0,
        locked_until: None,
        last_login_at: None,
        last_login_ip: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    app.identities.upsert(user.clone()).await;
    user
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize")))
        .expect("request")
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(req).await.expect("send request");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, HeaderMap, Value) {
    let body = json!({ "email": email, "password": password });
    send(&app.router, post_json("/api/auth/login", &body)).await
}

fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn test_login_returns_session_and_cookies() {
    let app = test_app();
    seed_user(&app, "advisor@shop.test", "correct horse").await;

    let (status, headers, body) = login(&app, "advisor@shop.test", "correct horse").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert!(!data["access_token"].as_str().unwrap().is_empty());
    assert_eq!(data["token_type"], "Bearer");
    assert_eq!(data["user"]["email"], "advisor@shop.test");

    let cookies = set_cookies(&headers);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("access_token=") && c.contains("HttpOnly")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh_token=") && c.contains("HttpOnly")));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = test_app();
    seed_user(&app, "advisor@shop.test", "correct horse").await;

    let (status, _, body) = login(&app, "advisor@shop.test", "battery staple").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_lockout_maps_to_423_with_retry_after() {
    let app = test_app();
    seed_user(&app, "a@b.com", "right-password").await;

    for _ in 0..5 {
        let (status, _, _) = login(&app, "a@b.com", "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Sixth attempt with the correct password is still rejected.
    let (status, headers, body) = login(&app, "a@b.com", "right-password").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert!(headers.contains_key(header::RETRY_AFTER));

    let retry = body["retry_after_seconds"].as_u64().unwrap();
    assert!(retry > 870 && retry <= 900, "retry_after was {retry}");
}

#[tokio::test]
async fn test_me_requires_a_valid_token() {
    let app = test_app();
    seed_user(&app, "advisor@shop.test", "correct horse").await;

    let bare = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .body(Body::empty())
        .expect("request");
    let (status, _, _) = send(&app.router, bare).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, _, body) = login(&app, "advisor@shop.test", "correct horse").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let authed = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request");
    let (status, _, body) = send(&app.router, authed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "advisor@shop.test");
}

/// Disabling an account takes effect on the next request, not at token
/// expiry: the authenticator re-reads the identity row.
#[tokio::test]
async fn test_disabled_account_is_rejected_despite_live_token() {
    let app = test_app();
    let user = seed_user(&app, "advisor@shop.test", "correct horse").await;

    let (_, _, body) = login(&app, "advisor@shop.test", "correct horse").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    app.identities
        .mutate_for_test(user.id, |u| u.enabled = false)
        .await;

    let authed = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request");
    let (status, _, _) = send(&app.router, authed).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = test_app();
    seed_user(&app, "advisor@shop.test", "correct horse").await;

    let (_, _, body) = login(&app, "advisor@shop.test", "correct horse").await;
    let first = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        &app.router,
        post_json("/api/auth/refresh-token", &json!({ "refresh_token": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    // Replaying the consumed token is treated as reuse.
    let (status, _, body) = send(
        &app.router,
        post_json("/api/auth/refresh-token", &json!({ "refresh_token": first })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "REFRESH_TOKEN_REUSE");
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = test_app();
    seed_user(&app, "advisor@shop.test", "correct horse").await;

    let (_, _, body) = login(&app, "advisor@shop.test", "correct horse").await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::COOKIE, format!("refresh_token={refresh}"))
        .body(Body::empty())
        .expect("request");
    let (status, headers, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let cookies = set_cookies(&headers);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("access_token=") && c.contains("Max-Age=0")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh_token=") && c.contains("Max-Age=0")));

    // The revoked refresh token no longer rotates.
    let (status, _, _) = send(
        &app.router,
        post_json("/api/auth/refresh-token", &json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// The documented logout body field revokes every session, even when no
/// refresh cookie accompanies the request.
#[tokio::test]
async fn test_logout_revoke_all_tokens_field() {
    let app = test_app();
    seed_user(&app, "advisor@shop.test", "correct horse").await;

    let (_, _, body) = login(&app, "advisor@shop.test", "correct horse").await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"revoke_all_tokens": true}"#))
        .expect("request");
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app.router,
        post_json("/api/auth/refresh-token", &json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(Body::empty())
        .expect("request");
    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

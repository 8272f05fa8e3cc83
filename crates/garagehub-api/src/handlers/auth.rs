//! Auth handlers: login, refresh-token, logout, me.
//!
//! Tokens travel two ways at once: in the JSON body for API clients and
//! in HttpOnly cookies for browsers. The cookies are never readable from
//! script; clearing them on logout uses removal cookies with matching
//! paths.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use garagehub_auth::session::{ClientMeta, LoginOutcome};
use garagehub_auth::{AuthContext, AuthError};
use garagehub_core::error::AppError;
use validator::Validate;

use crate::dto::request::{LoginRequest, LogoutRequest, RefreshRequest};
use crate::dto::response::{ApiResponse, MessageResponse, SessionResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::authenticate::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let meta = client_meta(&headers);
    let outcome = state
        .orchestrator
        .login(&req.email, &req.password, req.remember_me, &meta)
        .await?;

    let jar = session_cookies(jar, &outcome, state.config.api.secure_cookies);
    Ok((jar, Json(ApiResponse::ok(SessionResponse::from(&outcome)))))
}

/// POST /api/auth/refresh-token
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let token = body
        .and_then(|Json(req)| req.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AuthError::RefreshTokenInvalid)?;

    let meta = client_meta(&headers);
    let outcome = state.orchestrator.refresh(&token, &meta).await?;

    let jar = session_cookies(jar, &outcome, state.config.api.secure_cookies);
    Ok((jar, Json(ApiResponse::ok(SessionResponse::from(&outcome)))))
}

/// POST /api/auth/logout
///
/// Idempotent: succeeds whether or not a live session exists.
pub async fn logout(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    jar: CookieJar,
    body: Option<Json<LogoutRequest>>,
) -> Result<(CookieJar, Json<ApiResponse<MessageResponse>>), ApiError> {
    let revoke_all = body.map(|Json(req)| req.revoke_all_tokens).unwrap_or(false);
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let user_id = context.user().map(|u| u.user_id);

    state
        .orchestrator
        .logout(user_id, refresh_token.as_deref(), revoke_all)
        .await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));
    Ok((
        jar,
        Json(ApiResponse::ok(MessageResponse {
            message: "Logged out successfully".to_string(),
        })),
    ))
}

/// GET /api/auth/me
///
/// Reads the identity store rather than echoing token claims, so role
/// and status changes show up before the next refresh.
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .identities
        .find_by_id(user.user_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let origin_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    ClientMeta {
        origin_ip,
        user_agent,
    }
}

fn session_cookies(jar: CookieJar, outcome: &LoginOutcome, secure: bool) -> CookieJar {
    jar.add(build_cookie(
        ACCESS_COOKIE,
        outcome.access.token.clone(),
        outcome.access.expires_in,
        secure,
    ))
    .add(build_cookie(
        REFRESH_COOKIE,
        outcome.refresh_token.clone(),
        outcome.refresh_expires_in,
        secure,
    ))
}

fn build_cookie(name: &'static str, value: String, max_age_seconds: u64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(time::Duration::seconds(max_age_seconds as i64));
    cookie
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

//! Request authenticator middleware.
//!
//! Resolves whatever credential the request carries into an
//! [`AuthContext`] attached to the request extensions. This middleware
//! never rejects: anonymous and invalid-credential requests proceed with
//! an anonymous context, and enforcement happens in the [`CurrentUser`]
//! extractor on the handlers that need it.
//!
//! [`CurrentUser`]: crate::extractors::CurrentUser

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use garagehub_auth::AuthContext;

use crate::state::AppState;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token for browser clients.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Populate the request's [`AuthContext`].
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let public = state
        .config
        .api
        .public_paths
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()));

    let context = if public {
        AuthContext::Anonymous
    } else {
        resolve(&state, request.headers()).await
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Verify the presented token and load the identity row behind it.
///
/// Roles and the enabled flag come from the store, not the claims, so a
/// role change or account disable takes effect on the next request rather
/// than at token expiry. Any failure degrades to an anonymous context.
async fn resolve(state: &AppState, headers: &HeaderMap) -> AuthContext {
    let Some(token) = bearer_token(headers).or_else(|| cookie_token(headers)) else {
        return AuthContext::Anonymous;
    };

    let claims = match state.issuer.verify(&token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(code = err.code(), "access token rejected");
            return AuthContext::Anonymous;
        }
    };

    match state.identities.find_by_id(claims.sub).await {
        Ok(Some(user)) => AuthContext::from_identity(&user, &claims),
        Ok(None) => {
            debug!("token subject no longer exists");
            AuthContext::Anonymous
        }
        Err(err) => {
            warn!(error = %err, "identity lookup failed during authentication");
            AuthContext::Anonymous
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
}

//! `CurrentUser` extractor over the request's authentication context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use garagehub_auth::context::AuthenticatedUser;
use garagehub_auth::{AuthContext, AuthError};

use crate::error::ApiError;

/// The verified identity behind the current request.
///
/// Rejects with 401 when the request authenticator left the context
/// anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl std::ops::Deref for CurrentUser {
    type Target = AuthenticatedUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthContext>() {
            Some(AuthContext::Authenticated(user)) => Ok(Self(user.clone())),
            _ => Err(AuthError::Unauthenticated.into()),
        }
    }
}

//! Per-request identity context.
//!
//! The request authenticator resolves whatever credential is present into
//! an [`AuthContext`] and attaches it to the request. Handlers receive the
//! context explicitly; nothing reads ambient task-local state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use garagehub_core::error::AppError;
use garagehub_entity::user::{User, UserRole};

use crate::token::Claims;

/// Identity attached to one request.
#[derive(Debug, Clone, Default)]
pub enum AuthContext {
    /// No usable credential was presented, or verification failed.
    #[default]
    Anonymous,
    /// A valid access token was presented.
    Authenticated(AuthenticatedUser),
}

/// The verified identity behind an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID from the token subject.
    pub user_id: Uuid,
    /// Email.
    pub email: String,
    /// Current roles, read from the identity store at request time.
    pub roles: Vec<UserRole>,
    /// Token ID.
    pub token_id: Uuid,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    /// Build an authenticated context from verified claims and the freshly
    /// loaded identity row.
    ///
    /// Roles and email come from the row, not the claims, so role changes
    /// take effect immediately rather than at token expiry. A disabled
    /// identity reads as anonymous regardless of the token.
    pub fn from_identity(user: &User, claims: &Claims) -> Self {
        if !user.enabled {
            return Self::Anonymous;
        }
        Self::Authenticated(AuthenticatedUser {
            user_id: user.id,
            email: user.email.clone(),
            roles: user.roles.clone(),
            token_id: claims.jti,
            expires_at: claims.expires_at(),
        })
    }

    /// The authenticated identity, if any.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }

    /// Whether a verified identity is attached.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl AuthenticatedUser {
    /// Whether the identity holds at least one of the given roles.
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }
}

/// Require an authenticated identity holding at least one of `roles`.
///
/// Anonymous contexts read as unauthorized; authenticated contexts
/// without a matching role read as forbidden. An empty `roles` slice
/// requires authentication only.
pub fn require_any_role<'a>(
    context: &'a AuthContext,
    roles: &[UserRole],
) -> Result<&'a AuthenticatedUser, AppError> {
    let user = context
        .user()
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;
    if roles.is_empty() || user.has_any_role(roles) {
        Ok(user)
    } else {
        Err(AppError::forbidden("insufficient role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed(roles: Vec<UserRole>) -> AuthContext {
        AuthContext::Authenticated(AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "advisor@shop.test".to_string(),
            roles,
            token_id: Uuid::new_v4(),
            expires_at: Utc::now() + chrono::Duration::minutes(15),
        })
    }

    #[test]
    fn test_anonymous_is_unauthorized() {
        assert!(require_any_role(&AuthContext::Anonymous, &[]).is_err());
    }

    fn identity(enabled: bool, roles: Vec<UserRole>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "advisor@shop.test".to_string(),
            password_hash: String::new(),
            display_name: None,
            roles,
            enabled,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            last_login_ip: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn claims_for(user: &User) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user.id,
            email: user.email.clone(),
            // Stale role set: the row is the authority, not the token.
            roles: vec![UserRole::Admin],
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(15)).timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_from_identity_uses_current_roles() {
        let user = identity(true, vec![UserRole::Advisor]);
        let ctx = AuthContext::from_identity(&user, &claims_for(&user));
        let authed = ctx.user().unwrap();
        assert_eq!(authed.roles, vec![UserRole::Advisor]);
        assert_eq!(authed.user_id, user.id);
    }

    #[test]
    fn test_from_identity_disabled_is_anonymous() {
        let user = identity(false, vec![UserRole::Advisor]);
        let ctx = AuthContext::from_identity(&user, &claims_for(&user));
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_role_match() {
        let ctx = authed(vec![UserRole::Mechanic]);
        assert!(require_any_role(&ctx, &[UserRole::Admin, UserRole::Mechanic]).is_ok());
        assert!(require_any_role(&ctx, &[UserRole::Admin]).is_err());
        assert!(require_any_role(&ctx, &[]).is_ok());
    }
}

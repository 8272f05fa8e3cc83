//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Extends the refresh token lifetime when set.
    #[serde(default)]
    pub remember_me: bool,
}

/// Token refresh request body.
///
/// The token may come from the body or from the refresh cookie; the body
/// wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token, if not supplied via cookie.
    pub refresh_token: Option<String>,
}

/// Logout request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Revoke all of the user's sessions, not just this one.
    #[serde(default)]
    pub revoke_all_tokens: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_body_field_name() {
        let req: LogoutRequest = serde_json::from_str(r#"{"revoke_all_tokens": true}"#).unwrap();
        assert!(req.revoke_all_tokens);

        let req: LogoutRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.revoke_all_tokens);
    }
}

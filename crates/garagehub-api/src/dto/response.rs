//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use garagehub_auth::session::LoginOutcome;
use garagehub_entity::user::User;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Session payload returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Signed access token.
    pub access_token: String,
    /// Token scheme for the Authorization header.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Opaque refresh token.
    pub refresh_token: String,
    /// Refresh token lifetime in seconds.
    pub refresh_expires_in: u64,
    /// Whether the session carries the extended remember-me lifetime.
    pub remember_me: bool,
    /// The authenticated user.
    pub user: UserResponse,
}

impl From<&LoginOutcome> for SessionResponse {
    fn from(outcome: &LoginOutcome) -> Self {
        Self {
            access_token: outcome.access.token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: outcome.access.expires_in,
            refresh_token: outcome.refresh_token.clone(),
            refresh_expires_in: outcome.refresh_expires_in,
            remember_me: outcome.remember_me,
            user: UserResponse::from(&outcome.user),
        }
    }
}

/// User summary for responses. Never carries credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Email.
    pub email: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Role names.
    pub roles: Vec<String>,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            roles: user.roles.iter().map(|r| r.to_string()).collect(),
            enabled: user.enabled,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

//! Maps domain errors to HTTP responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use garagehub_auth::AuthError;
use garagehub_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Seconds until a locked account accepts attempts again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Error type returned by every handler.
///
/// Wraps the two domain error types so each maps to a status code in one
/// place. Credential-shaped authentication failures all surface as 401
/// with their own code; transient backend failures surface as 503 with a
/// generic message so internals never leak.
#[derive(Debug)]
pub enum ApiError {
    /// Authentication flow failure.
    Auth(AuthError),
    /// General application failure.
    App(AppError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(err) => auth_response(err),
            Self::App(err) => app_response(err),
        }
    }
}

fn auth_response(err: AuthError) -> Response {
    let (status, retry_after_seconds) = match &err {
        AuthError::AccountLocked {
            retry_after_seconds,
        } => (StatusCode::LOCKED, Some(*retry_after_seconds)),
        AuthError::AccountDisabled => (StatusCode::FORBIDDEN, None),
        AuthError::Transient(inner) => {
            tracing::error!(error = %inner, "transient auth backend failure");
            (StatusCode::SERVICE_UNAVAILABLE, None)
        }
        _ => (StatusCode::UNAUTHORIZED, None),
    };

    let message = match &err {
        AuthError::Transient(_) => "temporarily unavailable, try again".to_string(),
        other => other.to_string(),
    };

    let body = ApiErrorResponse {
        error: err.code().to_string(),
        message,
        retry_after_seconds,
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(seconds) = retry_after_seconds {
        if let Ok(value) = seconds.to_string().parse() {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

fn app_response(err: AppError) -> Response {
    let status = match err.kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization => {
            tracing::error!(error = %err, "internal server error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "internal server error".to_string()
    } else {
        err.message.clone()
    };

    let body = ApiErrorResponse {
        error: err.kind.to_string(),
        message,
        retry_after_seconds: None,
    };

    (status, Json(body)).into_response()
}

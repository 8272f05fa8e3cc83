//! Authentication error taxonomy.
//!
//! Control flow in the login orchestrator is driven by these variants, not
//! by exceptions: every failure mode a caller must distinguish is a variant
//! here, and store/transport failures stay separate in [`AuthError::Transient`]
//! so they can never be confused with a credential verdict.

use thiserror::Error;

use garagehub_core::AppError;

/// Failure modes of the authentication core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email/password or unknown email. Deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Too many recent failures; the account is locked.
    #[error("account locked, retry after {retry_after_seconds}s")]
    AccountLocked {
        /// Seconds until the lock expires.
        retry_after_seconds: u64,
    },

    /// The identity exists but is disabled.
    #[error("account is disabled")]
    AccountDisabled,

    /// The presented refresh token does not resolve to a live record.
    #[error("refresh token is invalid")]
    RefreshTokenInvalid,

    /// The refresh token exists but has passed its expiry.
    #[error("refresh token has expired")]
    RefreshTokenExpired,

    /// A refresh token was presented again after leaving the Active state.
    /// Treated as evidence of theft; the whole chain is revoked.
    #[error("refresh token reuse detected")]
    ReuseDetected,

    /// Access token signature or structure is invalid.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Access token is past its embedded expiry.
    #[error("token has expired")]
    TokenExpired,

    /// No usable credential was presented on a protected path.
    #[error("authentication required")]
    Unauthenticated,

    /// A store or transport failure. Never mapped to success; callers may
    /// retry with backoff.
    #[error("transient authentication backend failure")]
    Transient(#[from] AppError),
}

impl AuthError {
    /// Whether this failure should be appended to the attempt ledger.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::AccountDisabled | Self::AccountLocked { .. }
        )
    }

    /// Short machine-readable code for logs and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::RefreshTokenInvalid => "REFRESH_TOKEN_INVALID",
            Self::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            Self::ReuseDetected => "REFRESH_TOKEN_REUSE",
            Self::SignatureInvalid => "TOKEN_SIGNATURE_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Transient(_) => "TRANSIENT_FAILURE",
        }
    }
}

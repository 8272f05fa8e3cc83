//! The login orchestrator: single entry point for login, refresh, and
//! logout.
//!
//! Sequencing matters here. The lock check runs before credential
//! verification so a locked account never burns password work, the
//! disabled check runs after password verification so callers cannot
//! probe which emails exist, and every failure verdict leaves a ledger
//! record behind.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use garagehub_core::result::AppResult;
use garagehub_entity::user::User;

use crate::error::AuthError;
use crate::lockout::LockoutGuard;
use crate::password::PasswordHasher;
use crate::store::IdentityStore;
use crate::token::{IssuedAccessToken, TokenIssuer};

use super::rotation::RotationProtocol;
use super::ClientMeta;

/// Everything a successful login or refresh hands back to the transport
/// layer.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub user: User,
    /// Fresh signed access token.
    pub access: IssuedAccessToken,
    /// Fresh opaque refresh token (plaintext, for the client).
    pub refresh_token: String,
    /// Seconds of validity on the refresh token.
    pub refresh_expires_in: u64,
    /// Whether the session carries the extended remember-me TTL.
    pub remember_me: bool,
}

/// Outcome of a refresh-token exchange.
pub type RefreshOutcome = LoginOutcome;

/// Drives the full authentication flows over the guard, hasher, issuer,
/// and rotation protocol.
pub struct LoginOrchestrator {
    identities: Arc<dyn IdentityStore>,
    guard: Arc<LockoutGuard>,
    hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    rotation: Arc<RotationProtocol>,
}

impl LoginOrchestrator {
    /// Wire an orchestrator from its collaborators.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        guard: Arc<LockoutGuard>,
        hasher: PasswordHasher,
        issuer: Arc<TokenIssuer>,
        rotation: Arc<RotationProtocol>,
    ) -> Self {
        Self {
            identities,
            guard,
            hasher,
            issuer,
            rotation,
        }
    }

    /// Canonical email form: trimmed and lowercased.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Authenticate an email/password pair and open a session.
    #[instrument(skip_all, fields(origin_ip = %meta.origin_ip))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
        meta: &ClientMeta,
    ) -> Result<LoginOutcome, AuthError> {
        let email = Self::normalize_email(email);
        let now = Utc::now();

        let user = self.identities.find_by_email(&email).await?;

        if let Some(ref user) = user {
            if let Some(retry_after_seconds) = self.guard.retry_after(user, now) {
                // Locked accounts are reported as locked even on a correct
                // password; recording keeps the ledger complete but an
                // in-force lock is not re-extended by further attempts.
                self.record_failure_quietly(&email, None, meta, "account locked", now)
                    .await;
                return Err(AuthError::AccountLocked {
                    retry_after_seconds,
                });
            }
            self.guard.auto_unlock_if_expired(user, now).await?;
        }

        let verified = match &user {
            Some(user) => self.hasher.verify_password(password, &user.password_hash)?,
            // Unknown email: burn comparable time so timing does not
            // reveal which addresses exist.
            None => {
                let _ = self.hasher.hash_password(password)?;
                false
            }
        };

        if !verified {
            self.guard
                .record_failure(&email, user.as_ref(), meta, "bad password", now)
                .await?;
            return Err(AuthError::InvalidCredentials);
        }

        let user = match user {
            Some(user) => user,
            None => return Err(AuthError::InvalidCredentials),
        };

        if !user.enabled {
            self.guard
                .record_failure(&email, Some(&user), meta, "account disabled", now)
                .await?;
            return Err(AuthError::AccountDisabled);
        }

        let access = self.issuer.issue_access(&user)?;
        let pair = self.rotation.create(user.id, remember_me, meta).await?;
        self.guard.record_success(user.id, &email, meta).await?;
        self.identities
            .update_last_login(user.id, now, &meta.origin_ip)
            .await?;

        info!(user_id = %user.id, remember_me, "login succeeded");

        Ok(LoginOutcome {
            user,
            access,
            refresh_expires_in: self.rotation.ttl_seconds(pair.record.remember_me),
            remember_me: pair.record.remember_me,
            refresh_token: pair.token,
        })
    }

    /// Exchange a refresh token for a fresh session pair.
    ///
    /// The identity is re-read so revocation-sensitive state (disabled,
    /// deleted, changed roles) takes effect at the next refresh even
    /// though access tokens are verified statelessly.
    #[instrument(skip_all, fields(origin_ip = %meta.origin_ip))]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        meta: &ClientMeta,
    ) -> Result<RefreshOutcome, AuthError> {
        let pair = self.rotation.rotate(refresh_token, meta).await?;

        let user = self
            .identities
            .find_by_id(pair.record.user_id)
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        if !user.enabled {
            self.rotation.revoke_all(user.id).await?;
            return Err(AuthError::AccountDisabled);
        }

        let access = self.issuer.issue_access(&user)?;

        Ok(LoginOutcome {
            user,
            access,
            refresh_expires_in: self.rotation.ttl_seconds(pair.record.remember_me),
            remember_me: pair.record.remember_me,
            refresh_token: pair.token,
        })
    }

    /// Close a session. Idempotent: missing or already-dead tokens are
    /// not an error.
    ///
    /// With `everywhere` set, all of the user's sessions are revoked, not
    /// just the presented token's.
    pub async fn logout(
        &self,
        user_id: Option<Uuid>,
        refresh_token: Option<&str>,
        everywhere: bool,
    ) -> AppResult<()> {
        if let Some(token) = refresh_token {
            self.rotation.revoke(token).await?;
        }
        if everywhere {
            if let Some(user_id) = user_id {
                let revoked = self.rotation.revoke_all(user_id).await?;
                info!(%user_id, revoked, "logout everywhere");
            }
        }
        Ok(())
    }

    /// Run attempt-ledger retention. Used by the background worker.
    pub async fn purge_attempts(&self, retention: Duration) -> AppResult<u64> {
        self.guard.purge_attempts_older_than(Utc::now() - retention).await
    }

    /// Best-effort ledger append for verdicts that must not be masked by
    /// a ledger write failure.
    async fn record_failure_quietly(
        &self,
        email: &str,
        user: Option<&User>,
        meta: &ClientMeta,
        reason: &str,
        now: chrono::DateTime<Utc>,
    ) {
        if let Err(error) = self.guard.record_failure(email, user, meta, reason, now).await {
            tracing::warn!(%error, "failed to record login attempt");
        }
    }
}

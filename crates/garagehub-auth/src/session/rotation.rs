//! Refresh token generation and the rotation protocol.
//!
//! Refresh tokens are opaque: 32 random bytes, base64url-encoded for the
//! client, stored only as a SHA-256 hex digest. Rotation is one-shot. Each
//! token can be exchanged exactly once, enforced by a compare-and-swap in
//! the store, and presenting a consumed token revokes the owner's whole
//! session chain.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use garagehub_core::config::auth::AuthConfig;
use garagehub_core::result::AppResult;
use garagehub_entity::token::{NewRefreshToken, RefreshToken, TokenStatus};

use crate::error::AuthError;
use crate::store::RefreshTokenStore;

use super::ClientMeta;

/// Entropy of the opaque token string in bytes.
const TOKEN_BYTES: usize = 32;

/// A plaintext refresh token paired with its stored record.
///
/// The plaintext leaves the process exactly once, in the response that
/// carries it to the client.
#[derive(Debug, Clone)]
pub struct RotatedPair {
    /// Opaque token string for the client.
    pub token: String,
    /// The persisted record (digest only).
    pub record: RefreshToken,
}

/// Issues, validates, rotates, and revokes refresh tokens.
pub struct RotationProtocol {
    store: Arc<dyn RefreshTokenStore>,
    /// Standard TTL.
    refresh_ttl: Duration,
    /// Extended TTL for remember-me sessions.
    remember_me_ttl: Duration,
}

impl RotationProtocol {
    /// Create a protocol instance over the given store.
    pub fn new(store: Arc<dyn RefreshTokenStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            refresh_ttl: Duration::hours(config.refresh_ttl_hours as i64),
            remember_me_ttl: Duration::days(config.remember_me_ttl_days as i64),
        }
    }

    /// Generate a fresh opaque token string.
    fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// SHA-256 hex digest of a token string, the only form kept at rest.
    pub fn digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex_encode(&hasher.finalize())
    }

    fn ttl_for(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.remember_me_ttl
        } else {
            self.refresh_ttl
        }
    }

    /// Issue a new refresh token for a fresh login.
    ///
    /// Revokes every other Active token the user holds first, so each
    /// identity carries at most one live session.
    pub async fn create(
        &self,
        user_id: Uuid,
        remember_me: bool,
        meta: &ClientMeta,
    ) -> AppResult<RotatedPair> {
        let now = Utc::now();
        let displaced = self.store.revoke_all_for_user(user_id, now).await?;
        if displaced > 0 {
            debug!(%user_id, displaced, "displaced previous session on login");
        }
        self.issue(user_id, remember_me, meta, now).await
    }

    async fn issue(
        &self,
        user_id: Uuid,
        remember_me: bool,
        meta: &ClientMeta,
        now: DateTime<Utc>,
    ) -> AppResult<RotatedPair> {
        let token = Self::generate_token();
        let record = self
            .store
            .insert(&NewRefreshToken {
                token_hash: Self::digest(&token),
                user_id,
                remember_me,
                origin_ip: meta.origin_ip.clone(),
                user_agent: meta.user_agent.clone(),
                expires_at: now + self.ttl_for(remember_me),
            })
            .await?;
        Ok(RotatedPair { token, record })
    }

    /// Resolve a presented token string to its live record without
    /// consuming it.
    pub async fn validate(&self, token: &str) -> Result<RefreshToken, AuthError> {
        let record = self
            .store
            .find_by_hash(&Self::digest(token))
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;
        self.check_live(&record, Utc::now()).await?;
        Ok(record)
    }

    /// Exchange a presented token for a fresh one.
    ///
    /// The old token moves Active→Rotated via compare-and-swap; of N
    /// concurrent calls with the same token exactly one receives the new
    /// pair. Losers, and any caller presenting an already-consumed token,
    /// get [`AuthError::ReuseDetected`] after the owner's remaining tokens
    /// are revoked.
    pub async fn rotate(&self, token: &str, meta: &ClientMeta) -> Result<RotatedPair, AuthError> {
        let digest = Self::digest(token);
        let now = Utc::now();

        let record = self
            .store
            .find_by_hash(&digest)
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;
        self.check_live(&record, now).await?;

        let Some(old) = self.store.mark_rotated_if_active(&digest, now).await? else {
            // Lost the race: someone else consumed it between the read and
            // the swap. Indistinguishable from replay, so treat it as such.
            self.flag_reuse(record.user_id, now).await?;
            return Err(AuthError::ReuseDetected);
        };

        let pair = self.issue(old.user_id, old.remember_me, meta, now).await?;
        debug!(user_id = %old.user_id, "refresh token rotated");
        Ok(pair)
    }

    async fn check_live(&self, record: &RefreshToken, now: DateTime<Utc>) -> Result<(), AuthError> {
        if record.status != TokenStatus::Active {
            self.flag_reuse(record.user_id, now).await?;
            return Err(AuthError::ReuseDetected);
        }
        if record.expires_at <= now {
            return Err(AuthError::RefreshTokenExpired);
        }
        Ok(())
    }

    async fn flag_reuse(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let revoked = self.store.revoke_all_for_user(user_id, now).await?;
        warn!(
            %user_id,
            revoked,
            "consumed refresh token presented again; session chain revoked"
        );
        Ok(())
    }

    /// Revoke a single presented token. Idempotent; unknown tokens are a
    /// no-op.
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        self.store
            .revoke_by_hash(&Self::digest(token), Utc::now())
            .await?;
        Ok(())
    }

    /// Revoke every live token the user holds.
    pub async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64> {
        self.store.revoke_all_for_user(user_id, Utc::now()).await
    }

    /// Expire stale tokens and drop dead rows past the retention cutoff.
    pub async fn cleanup(&self, retain_until: DateTime<Utc>) -> AppResult<u64> {
        self.store.cleanup(Utc::now(), retain_until).await
    }

    /// Seconds of validity for a token issued now with this flag.
    pub fn ttl_seconds(&self, remember_me: bool) -> u64 {
        self.ttl_for(remember_me).num_seconds().max(0) as u64
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRefreshTokenStore;
    use garagehub_entity::token::TokenStatus;

    fn protocol(store: Arc<MemoryRefreshTokenStore>) -> RotationProtocol {
        RotationProtocol::new(store, &AuthConfig::default())
    }

    fn meta() -> ClientMeta {
        ClientMeta::new("10.0.0.1", Some("test-suite"))
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let d = RotationProtocol::digest("token");
        assert_eq!(d.len(), 64);
        assert_eq!(d, RotationProtocol::digest("token"));
        assert_ne!(d, RotationProtocol::digest("token2"));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = RotationProtocol::generate_token();
        let b = RotationProtocol::generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 43); // 32 bytes base64url, unpadded
    }

    #[tokio::test]
    async fn test_create_displaces_previous_session() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = protocol(store.clone());
        let user_id = Uuid::new_v4();

        let first = protocol.create(user_id, false, &meta()).await.unwrap();
        let _second = protocol.create(user_id, false, &meta()).await.unwrap();

        assert_eq!(store.active_count_for(user_id).await, 1);
        let old = store
            .find_by_hash(&first.record.token_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, TokenStatus::Revoked);
    }

    #[tokio::test]
    async fn test_rotate_preserves_remember_me() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = protocol(store);
        let user_id = Uuid::new_v4();

        let pair = protocol.create(user_id, true, &meta()).await.unwrap();
        let rotated = protocol.rotate(&pair.token, &meta()).await.unwrap();

        assert!(rotated.record.remember_me);
        assert_ne!(rotated.token, pair.token);
    }

    #[tokio::test]
    async fn test_reuse_revokes_chain() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = protocol(store.clone());
        let user_id = Uuid::new_v4();

        let pair = protocol.create(user_id, false, &meta()).await.unwrap();
        let rotated = protocol.rotate(&pair.token, &meta()).await.unwrap();

        // Replay of the consumed token.
        let err = protocol.rotate(&pair.token, &meta()).await.unwrap_err();
        assert!(matches!(err, AuthError::ReuseDetected));

        // The replacement issued by the legitimate rotation is dead too.
        let current = store
            .find_by_hash(&rotated.record.token_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, TokenStatus::Revoked);
    }

    #[tokio::test]
    async fn test_expired_token_is_expired_not_reuse() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = protocol(store.clone());
        let user_id = Uuid::new_v4();

        let pair = protocol.create(user_id, false, &meta()).await.unwrap();
        store
            .mutate_for_test(&pair.record.token_hash, |t| {
                t.expires_at = Utc::now() - Duration::minutes(1);
            })
            .await;

        let err = protocol.rotate(&pair.token, &meta()).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenExpired));
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = protocol(store);

        let err = protocol.rotate("no-such-token", &meta()).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenInvalid));
    }

    #[tokio::test]
    async fn test_concurrent_rotation_single_winner() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = Arc::new(protocol(store));
        let user_id = Uuid::new_v4();
        let pair = protocol.create(user_id, false, &meta()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let protocol = protocol.clone();
            let token = pair.token.clone();
            handles.push(tokio::spawn(async move {
                protocol.rotate(&token, &meta()).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let protocol = protocol(store);
        let user_id = Uuid::new_v4();

        let pair = protocol.create(user_id, false, &meta()).await.unwrap();
        protocol.revoke(&pair.token).await.unwrap();
        protocol.revoke(&pair.token).await.unwrap();
        protocol.revoke("never-issued").await.unwrap();

        let err = protocol.validate(&pair.token).await.unwrap_err();
        assert!(matches!(err, AuthError::ReuseDetected));
    }
}

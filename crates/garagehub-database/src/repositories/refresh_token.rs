//! Refresh token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use garagehub_core::error::{AppError, ErrorKind};
use garagehub_core::result::AppResult;
use garagehub_entity::token::{NewRefreshToken, RefreshToken};

/// Repository for refresh token persistence and state transitions.
///
/// Rotation correctness hinges on [`Self::mark_rotated_if_active`]: the
/// Active→Rotated transition is a single conditional UPDATE, so of two
/// concurrent rotations of the same token exactly one observes the Active
/// row.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new Active token record.
    pub async fn insert(&self, token: &NewRefreshToken) -> AppResult<RefreshToken> {
        sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens \
             (token_hash, user_id, status, remember_me, origin_ip, user_agent, expires_at) \
             VALUES ($1, $2, 'active', $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.remember_me)
        .bind(&token.origin_ip)
        .bind(&token.user_agent)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("refresh_tokens_token_hash_key") =>
            {
                AppError::conflict("Refresh token digest collision")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert refresh token", e),
        })
    }

    /// Find a token record by its digest, regardless of state.
    pub async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e)
            })
    }

    /// Atomically transition a token Active→Rotated.
    ///
    /// Returns the row if this caller won the transition, `None` if the
    /// token was missing or already non-Active.
    pub async fn mark_rotated_if_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>(
            "UPDATE refresh_tokens SET status = 'rotated', revoked_at = $2 \
             WHERE token_hash = $1 AND status = 'active' \
             RETURNING *",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rotate token", e))
    }

    /// Revoke a single token by digest. Idempotent: revoking a non-Active
    /// token is a no-op.
    pub async fn revoke_by_hash(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET status = 'revoked', revoked_at = $2 \
             WHERE token_hash = $1 AND status = 'active'",
        )
        .bind(token_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke token", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every Active token owned by the given user.
    pub async fn revoke_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET status = 'revoked', revoked_at = $2 \
             WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user tokens", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Mark expired Active tokens and delete dead rows past the retention
    /// window. Returns the number of deleted rows.
    pub async fn cleanup(&self, now: DateTime<Utc>, retain_until: DateTime<Utc>) -> AppResult<u64> {
        sqlx::query(
            "UPDATE refresh_tokens SET status = 'expired', revoked_at = $1 \
             WHERE status = 'active' AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to expire tokens", e)
        })?;

        let deleted = sqlx::query(
            "DELETE FROM refresh_tokens \
             WHERE status <> 'active' AND COALESCE(revoked_at, expires_at) < $1",
        )
        .bind(retain_until)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete dead tokens", e)
        })?;

        Ok(deleted.rows_affected())
    }
}

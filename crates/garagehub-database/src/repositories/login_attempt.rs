//! Login attempt ledger repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use garagehub_core::error::{AppError, ErrorKind};
use garagehub_core::result::AppResult;
use garagehub_entity::attempt::{LoginAttempt, NewLoginAttempt};

/// Repository for the append-only login attempt ledger.
#[derive(Debug, Clone)]
pub struct LoginAttemptRepository {
    pool: PgPool,
}

impl LoginAttemptRepository {
    /// Create a new login attempt repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an attempt record. Records are never mutated afterwards.
    pub async fn insert(&self, attempt: &NewLoginAttempt) -> AppResult<LoginAttempt> {
        sqlx::query_as::<_, LoginAttempt>(
            "INSERT INTO login_attempts (email, origin_ip, user_agent, success, failure_reason) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(&attempt.email)
        .bind(&attempt.origin_ip)
        .bind(&attempt.user_agent)
        .bind(attempt.success)
        .bind(&attempt.failure_reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record attempt", e))
    }

    /// Count failed attempts for an email since the given instant.
    ///
    /// Emails are compared case-insensitively so lockout counting matches
    /// identity resolution.
    pub async fn count_failures_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM login_attempts \
             WHERE LOWER(email) = LOWER($1) AND success = FALSE AND attempted_at >= $2",
        )
        .bind(email)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count failures", e))?;

        Ok(count.max(0) as u32)
    }

    /// Delete attempt records older than the given instant.
    ///
    /// Returns the number of deleted rows. Runs off the request path only.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE attempted_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge attempts", e)
            })?;

        Ok(result.rows_affected())
    }
}

//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use garagehub_core::error::{AppError, ErrorKind};
use garagehub_core::result::AppResult;
use garagehub_entity::user::User;

/// Repository for user reads and the narrow auth-owned write paths.
///
/// The authoritative write path for profile and password changes lives in
/// account management; this repository only covers what the auth core
/// mutates: lockout fields and last-login fields.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    /// Set the failure counter, idempotent read-modify-write.
    pub async fn set_failed_attempts(&self, user_id: Uuid, count: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update failed attempts", e)
        })?;
        Ok(())
    }

    /// Lock a user account until the given time, storing the triggering count.
    pub async fn lock_until(
        &self,
        user_id: Uuid,
        count: i32,
        until: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = $2, locked_until = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(count)
        .bind(until)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock user", e))?;
        Ok(())
    }

    /// Clear lock fields and reset the failure counter to zero.
    pub async fn clear_lockout(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear lockout", e))?;
        Ok(())
    }

    /// Update last-login timestamp and origin.
    pub async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
        origin_ip: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET last_login_at = $2, last_login_ip = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(at)
        .bind(origin_ip)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
        })?;
        Ok(())
    }
}

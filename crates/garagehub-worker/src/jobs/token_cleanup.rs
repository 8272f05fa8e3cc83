//! Refresh token cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::info;

use garagehub_auth::store::RefreshTokenStore;
use garagehub_core::result::AppResult;

use super::MaintenanceJob;

/// Marks overdue Active tokens as Expired and deletes dead rows past the
/// retention period.
///
/// Validation already rejects expired tokens on its own; this job keeps
/// the table honest and bounded, and the short retention on dead rows
/// preserves them long enough for reuse detection to observe a replay.
pub struct TokenCleanupJob {
    store: Arc<dyn RefreshTokenStore>,
    retention: Duration,
}

impl TokenCleanupJob {
    /// Create a cleanup job with the given dead-row retention in days.
    pub fn new(store: Arc<dyn RefreshTokenStore>, retention_days: u64) -> Self {
        Self {
            store,
            retention: Duration::days(retention_days as i64),
        }
    }
}

#[async_trait]
impl MaintenanceJob for TokenCleanupJob {
    fn name(&self) -> &'static str {
        "token_cleanup"
    }

    async fn run(&self) -> AppResult<u64> {
        let now = Utc::now();
        let touched = self.store.cleanup(now, now - self.retention).await?;
        if touched > 0 {
            info!(touched, "cleaned up refresh tokens");
        }
        Ok(touched)
    }
}

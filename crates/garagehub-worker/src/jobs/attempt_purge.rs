//! Attempt ledger retention.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::info;

use garagehub_auth::store::AttemptLedger;
use garagehub_core::result::AppResult;

use super::MaintenanceJob;

/// Deletes login attempt records older than the retention period.
///
/// Retention is far longer than the lockout window, so purging never
/// affects lockout decisions; it only bounds table growth.
pub struct AttemptPurgeJob {
    ledger: Arc<dyn AttemptLedger>,
    retention: Duration,
}

impl AttemptPurgeJob {
    /// Create a purge job with the given retention in days.
    pub fn new(ledger: Arc<dyn AttemptLedger>, retention_days: u64) -> Self {
        Self {
            ledger,
            retention: Duration::days(retention_days as i64),
        }
    }
}

#[async_trait]
impl MaintenanceJob for AttemptPurgeJob {
    fn name(&self) -> &'static str {
        "attempt_purge"
    }

    async fn run(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - self.retention;
        let purged = self.ledger.purge_older_than(cutoff).await?;
        if purged > 0 {
            info!(purged, %cutoff, "purged stale login attempts");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagehub_auth::store::MemoryAttemptLedger;
    use garagehub_entity::attempt::NewLoginAttempt;

    #[tokio::test]
    async fn test_purges_only_stale_records() {
        let ledger = Arc::new(MemoryAttemptLedger::new());
        let now = Utc::now();

        ledger
            .record_at_for_test(
                &NewLoginAttempt::failure("a@b.com", "10.0.0.1", None, "bad password"),
                now - Duration::days(45),
            )
            .await;
        ledger
            .record_at_for_test(
                &NewLoginAttempt::failure("a@b.com", "10.0.0.1", None, "bad password"),
                now - Duration::days(1),
            )
            .await;

        let job = AttemptPurgeJob::new(ledger.clone(), 30);
        assert_eq!(job.run().await.unwrap(), 1);
        assert_eq!(ledger.len().await, 1);
    }
}

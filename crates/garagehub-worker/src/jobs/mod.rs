//! Maintenance job definitions.

pub mod attempt_purge;
pub mod token_cleanup;

use async_trait::async_trait;

use garagehub_core::result::AppResult;

pub use attempt_purge::AttemptPurgeJob;
pub use token_cleanup::TokenCleanupJob;

/// One periodic maintenance task.
///
/// Jobs are best-effort: a failed run is logged and retried at the next
/// tick, never escalated.
#[async_trait]
pub trait MaintenanceJob: Send + Sync {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Run one pass, returning the number of rows affected.
    async fn run(&self) -> AppResult<u64>;
}

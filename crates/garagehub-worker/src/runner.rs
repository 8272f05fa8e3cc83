//! Worker runner: drives each maintenance job on its own interval until
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{error, info};

use crate::jobs::MaintenanceJob;

/// Runs a set of maintenance jobs, each on a fixed interval, until the
/// cancel signal fires.
///
/// Jobs run sequentially within their own loop but independently of each
/// other. A failed run is logged and retried at the next tick.
pub struct WorkerRunner {
    jobs: Vec<(Arc<dyn MaintenanceJob>, Duration)>,
}

impl WorkerRunner {
    /// Create an empty runner.
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register a job with its run interval.
    pub fn register(mut self, job: Arc<dyn MaintenanceJob>, interval: Duration) -> Self {
        self.jobs.push((job, interval));
        self
    }

    /// Spawn one task per job. The returned handles complete once the
    /// cancel signal is observed.
    pub fn start(self, cancel: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.jobs
            .into_iter()
            .map(|(job, interval)| {
                let cancel = cancel.clone();
                tokio::spawn(run_job(job, interval, cancel))
            })
            .collect()
    }
}

impl Default for WorkerRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_job(
    job: Arc<dyn MaintenanceJob>,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    info!(job = job.name(), interval_secs = interval.as_secs(), "maintenance job started");

    let mut ticker = time::interval(interval);
    // The first tick fires immediately; skip it so startup is not a
    // thundering herd of maintenance passes.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    info!(job = job.name(), "maintenance job stopped");
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(err) = job.run().await {
                    error!(job = job.name(), error = %err, "maintenance run failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use garagehub_core::result::AppResult;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingJob {
        runs: Arc<AtomicU64>,
    }

    #[async_trait]
    impl MaintenanceJob for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self) -> AppResult<u64> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_runs_until_cancelled() {
        let runs = Arc::new(AtomicU64::new(0));
        let runner = WorkerRunner::new().register(
            Arc::new(CountingJob { runs: runs.clone() }),
            Duration::from_millis(10),
        );

        let (tx, rx) = watch::channel(false);
        let handles = runner.start(rx);

        time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        let observed = runs.load(Ordering::SeqCst);
        assert!(observed >= 2, "job ran {observed} times");

        // No further runs after shutdown.
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), observed);
    }
}

//! # garagehub-worker
//!
//! Background maintenance for the authentication core: attempt-ledger
//! retention and refresh-token cleanup, run on fixed intervals off the
//! request path.

pub mod jobs;
pub mod runner;

pub use jobs::{AttemptPurgeJob, MaintenanceJob, TokenCleanupJob};
pub use runner::WorkerRunner;

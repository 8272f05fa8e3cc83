//! Brute-force lockout over the attempt ledger.

pub mod guard;

pub use guard::{LockoutGuard, LockoutPolicy};

//! Login attempt ledger entities.

pub mod model;

pub use model::{LoginAttempt, NewLoginAttempt};

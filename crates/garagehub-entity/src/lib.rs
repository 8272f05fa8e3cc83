//! # garagehub-entity
//!
//! Domain entities for the GarageHub authentication core:
//!
//! - `user` — accounts capable of authenticating, with lockout state
//! - `attempt` — append-only login attempt records
//! - `token` — long-lived refresh tokens and their state machine

pub mod attempt;
pub mod token;
pub mod user;

pub use attempt::LoginAttempt;
pub use token::{RefreshToken, TokenStatus};
pub use user::{User, UserRole};

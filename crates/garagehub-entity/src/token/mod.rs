//! Refresh token entities and state machine.

pub mod model;
pub mod status;

pub use model::{NewRefreshToken, RefreshToken};
pub use status::TokenStatus;

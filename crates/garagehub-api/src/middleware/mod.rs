//! Tower middleware.

pub mod authenticate;
pub mod logging;

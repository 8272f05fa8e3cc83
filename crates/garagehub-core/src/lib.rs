//! # garagehub-core
//!
//! Shared foundation for the GarageHub platform: configuration schemas,
//! the unified [`AppError`] type, and the [`AppResult`] alias.

pub mod config;
pub mod error;
pub mod result;

pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;

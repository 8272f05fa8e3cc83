//! # garagehub-database
//!
//! PostgreSQL database connection management and concrete repository
//! implementations for the GarageHub authentication core.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;

//! # garagehub-auth
//!
//! Authentication and session security core for the GarageHub platform.
//!
//! ## Modules
//!
//! - `password` — Argon2id password hashing and verification
//! - `token` — short-lived signed access tokens (issue + verify)
//! - `store` — identity / attempt-ledger / refresh-token store traits and adapters
//! - `lockout` — brute-force lockout guard over the attempt ledger
//! - `session` — refresh token rotation protocol and the login orchestrator
//! - `context` — explicit per-request identity context and role checks

pub mod context;
pub mod error;
pub mod lockout;
pub mod password;
pub mod session;
pub mod store;
pub mod token;

pub use context::{require_any_role, AuthContext};
pub use error::AuthError;
pub use lockout::LockoutGuard;
pub use password::PasswordHasher;
pub use session::{ClientMeta, LoginOrchestrator, RotationProtocol};
pub use store::{AttemptLedger, IdentityStore, RefreshTokenStore};
pub use token::{Claims, TokenIssuer};

//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use garagehub_auth::session::LoginOrchestrator;
use garagehub_auth::store::IdentityStore;
use garagehub_auth::token::TokenIssuer;
use garagehub_core::config::AppConfig;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Login, refresh, and logout flows.
    pub orchestrator: Arc<LoginOrchestrator>,
    /// Access token verification for the request authenticator.
    pub issuer: Arc<TokenIssuer>,
    /// Identity reads for the request authenticator and `/auth/me`.
    pub identities: Arc<dyn IdentityStore>,
}

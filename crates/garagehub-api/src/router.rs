//! Route definitions for the GarageHub HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to all handlers via Axum's `State` extractor.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints: login, refresh-token, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh-token", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Health check endpoint (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

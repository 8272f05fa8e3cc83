//! GarageHub Server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use garagehub_core::config::AppConfig;
use garagehub_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("GARAGEHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting GarageHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = garagehub_database::DatabasePool::connect(&config.database).await?;
    garagehub_database::migration::run_migrations(db.pool()).await?;
    let pool = db.into_pool();

    // ── Step 2: Repositories and store adapters ──────────────────
    let user_repo = Arc::new(garagehub_database::repositories::UserRepository::new(
        pool.clone(),
    ));
    let attempt_repo = Arc::new(
        garagehub_database::repositories::LoginAttemptRepository::new(pool.clone()),
    );
    let token_repo = Arc::new(
        garagehub_database::repositories::RefreshTokenRepository::new(pool.clone()),
    );

    let identities: Arc<dyn garagehub_auth::IdentityStore> =
        Arc::new(garagehub_auth::store::PgIdentityStore::new(user_repo));
    let ledger: Arc<dyn garagehub_auth::AttemptLedger> =
        Arc::new(garagehub_auth::store::PgAttemptLedger::new(attempt_repo));
    let tokens: Arc<dyn garagehub_auth::RefreshTokenStore> =
        Arc::new(garagehub_auth::store::PgRefreshTokenStore::new(token_repo));

    // ── Step 3: Authentication core ──────────────────────────────
    tracing::info!("Initializing authentication core...");
    let issuer = Arc::new(garagehub_auth::TokenIssuer::new(&config.auth)?);
    let guard = Arc::new(garagehub_auth::LockoutGuard::new(
        Arc::clone(&identities),
        Arc::clone(&ledger),
        garagehub_auth::lockout::LockoutPolicy::from_config(&config.auth),
    ));
    let rotation = Arc::new(garagehub_auth::RotationProtocol::new(
        Arc::clone(&tokens),
        &config.auth,
    ));
    let orchestrator = Arc::new(garagehub_auth::LoginOrchestrator::new(
        Arc::clone(&identities),
        Arc::clone(&guard),
        garagehub_auth::PasswordHasher::new(),
        Arc::clone(&issuer),
        Arc::clone(&rotation),
    ));

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Background maintenance worker ────────────────────
    let worker_handles = if config.worker.enabled {
        tracing::info!("Starting maintenance worker...");
        let runner = garagehub_worker::WorkerRunner::new()
            .register(
                Arc::new(garagehub_worker::AttemptPurgeJob::new(
                    Arc::clone(&ledger),
                    config.auth.attempt_retention_days,
                )),
                Duration::from_secs(config.worker.attempt_purge_interval_minutes * 60),
            )
            .register(
                Arc::new(garagehub_worker::TokenCleanupJob::new(
                    Arc::clone(&tokens),
                    config.worker.token_retention_days,
                )),
                Duration::from_secs(config.worker.token_cleanup_interval_minutes * 60),
            );
        runner.start(shutdown_rx.clone())
    } else {
        tracing::info!("Maintenance worker disabled");
        Vec::new()
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app_state = garagehub_api::AppState {
        config: Arc::new(config.clone()),
        orchestrator,
        issuer,
        identities,
    };

    let app = garagehub_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("GarageHub server listening on {addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    for handle in worker_handles {
        let _ = tokio::time::timeout(grace, handle).await;
    }

    tracing::info!("GarageHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

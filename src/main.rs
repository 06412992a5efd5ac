//! PrintQuote Server — account and session backend for the
//! 3D-printing cost estimation platform.
//!
//! Main entry point that wires all crates together and starts the
//! background session sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use printquote_auth::account::AccountService;
use printquote_auth::jwt::{JwtDecoder, JwtEncoder};
use printquote_auth::password::PasswordHasher;
use printquote_auth::session::{SessionManager, SessionSweeper};
use printquote_core::config::AppConfig;
use printquote_core::error::AppError;
use printquote_core::traits::LogMailSender;
use printquote_database::repositories::{SessionRepository, UserRepository};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("PRINTQUOTE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
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
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PrintQuote v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = printquote_database::connection::create_pool(&config.database).await?;

    printquote_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Initialize repositories ──────────────────────────
    let user_repo = Arc::new(UserRepository::new(db_pool.clone()));
    let session_repo = Arc::new(SessionRepository::new(db_pool.clone()));

    // ── Step 3: Initialize auth system ───────────────────────────
    tracing::info!("Initializing authentication system...");
    let password_hasher = Arc::new(PasswordHasher::new());
    let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
    let session_manager = Arc::new(SessionManager::new(
        Arc::clone(&jwt_encoder),
        Arc::clone(&jwt_decoder),
        session_repo,
        config.session.clone(),
    ));
    let mailer = Arc::new(LogMailSender);
    // Held for the lifetime of the process; the transport layer deployed
    // alongside this binary takes its handle from here.
    let _account_service = Arc::new(AccountService::new(
        user_repo,
        password_hasher,
        Arc::clone(&session_manager),
        mailer,
        config.auth.clone(),
    ));
    tracing::info!("Authentication system initialized");

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Start expired session sweeper ────────────────────
    let sweeper = SessionSweeper::new(Arc::clone(&session_manager));
    let interval = Duration::from_secs(config.session.sweep_interval_minutes * 60);
    tracing::info!(
        "Starting session sweeper (interval: {}m)",
        config.session.sweep_interval_minutes
    );

    let mut sweep_cancel = shutdown_rx.clone();
    let sweeper_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweeper.run_sweep_logged().await;
                }
                _ = sweep_cancel.changed() => break,
            }
        }
    });

    tracing::info!("PrintQuote server started");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;

    db_pool.close().await;
    tracing::info!("PrintQuote server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

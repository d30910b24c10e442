//! PrompIP Backend Service
//!
//! Main entry point for the PrompIP prompt marketplace backend.
//! This service provides:
//! - REST API for prompts, verifications and leaderboards
//! - Reputation and trust score bookkeeping
//! - Story Protocol registration and license minting

use prompip_backend::config::AppConfig;
use prompip_backend::database::{create_pool, run_migrations};
use prompip_backend::error::{AppError, AppResult};
use prompip_backend::http::create_router;
use prompip_backend::story_client::{StoryClient, StoryGateway};
use prompip_backend::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("prompip_backend={},sqlx=warn,axum=info", config.log_level).into()
            }),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           PrompIP Backend Service Starting                ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    // Run migrations
    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    info!("Initializing core services...");

    // Initialize Story Protocol client
    let story_client: Arc<dyn StoryGateway> =
        Arc::new(StoryClient::with_config(config.story.clone())?);
    info!("✓ Story client initialized");

    // Initialize application state with repositories and services
    let app_state = Arc::new(AppState::new(pool, story_client));
    info!("✓ Application state initialized with repositories");

    // =========================================================================
    // HTTP SERVER
    // =========================================================================
    let router = create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind {}: {}", addr, e)))?;

    info!("✓ HTTP server listening on {}", addr);
    info!("PrompIP backend ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Message(format!("HTTP server error: {}", e)))?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown handler: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

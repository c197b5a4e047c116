//! CFBD Proxy - A caching proxy for the CollegeFootballData API
//!
//! Wraps the upstream API with rate limiting, TTL caching, retries, and
//! typed response validation, and serves the results over a small REST
//! surface.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cfbd_proxy::api::{create_router, AppState};
use cfbd_proxy::client::CfbdClient;
use cfbd_proxy::config::Config;
use cfbd_proxy::query::QueryRegistry;
use cfbd_proxy::tasks::spawn_sweeper_task;

/// Main entry point for the CFBD proxy server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables (API key required)
/// 3. Build the upstream client and query registry
/// 4. Start background cache sweeper task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfbd_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CFBD Proxy Server");

    // Load configuration from environment variables
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: base_url={}, port={}, rate_limit={}ms, cache_ttl={}ms, sweep_interval={}s",
        config.base_url,
        config.server_port,
        config.rate_limit_ms,
        config.cache_ttl_ms,
        config.sweep_interval
    );

    // Build the upstream client and the query registry
    let client = Arc::new(CfbdClient::from_config(&config));
    let registry = Arc::new(QueryRegistry::new());
    let state = AppState::new(client.clone(), registry);
    info!("Upstream client initialized");

    // Start background sweeper task
    let sweeper_handle = spawn_sweeper_task(client, config.sweep_interval);
    info!("Background sweeper task started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweeper_handle))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweeper task and allows graceful shutdown.
async fn shutdown_signal(sweeper_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the sweeper task
    sweeper_handle.abort();
    warn!("Sweeper task aborted");
}

//! Singleton Resolve - fetch-once route data resolvers
//!
//! Serves route data from upstream APIs, fetching each route once and
//! caching it for every later navigation.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use singleton_resolve::{api::create_router, spawn_warmup_task, AppState, Config};

/// Main entry point for the route data server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register one resolver per configured route
/// 4. Start background warm-up task, if enabled
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "singleton_resolve=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting route data server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: routes={}, fetch_timeout={}s, warmup_interval={}s, port={}",
        config.routes.len(),
        config.fetch_timeout,
        config.warmup_interval,
        config.server_port
    );
    let state = AppState::from_config(&config)?;
    if state.navigator.is_empty() {
        warn!("No routes configured, set ROUTES=name=url,...");
    }

    let warmup_handle = if config.warmup_interval > 0 {
        let handle = spawn_warmup_task(state.navigator.clone(), config.warmup_interval);
        info!("Background warm-up task started");
        Some(handle)
    } else {
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(warmup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the warm-up task if it is still running.
async fn shutdown_signal(warmup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
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

    if let Some(handle) = warmup_handle {
        if !handle.is_finished() {
            handle.abort();
            warn!("Warm-up task aborted");
        }
    }
}

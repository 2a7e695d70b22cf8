//! Shard Cache - A sharded in-memory key-value cache server
//!
//! Provides TTL expiration checked on read, stack-ordered lists sharing the
//! same keyspace, and snapshot persistence to a JSON file or SQLite.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shard_cache::api::create_router;
use shard_cache::persistence;
use shard_cache::{spawn_snapshot_task, AppState, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the sharded store and open the persistence backend
/// 4. Hydrate the store from the last snapshot
/// 5. Start the periodic snapshot task, if configured
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop serving and flush a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shard_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shard Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, shards={}, persistence={:?}, snapshot_interval={}s, auth={}",
        config.server_port,
        config.shard_count,
        config.persistence(),
        config.snapshot_interval,
        config.auth_token.is_some()
    );

    let state = AppState::from_config(&config).context("failed to open persistence backend")?;
    info!("Store initialized with {} shards", state.store.shard_count());

    if let Some(backend) = &state.backend {
        persistence::hydrate(&state.store, backend.as_ref()).await;
    }

    let snapshot_handle = match &state.backend {
        Some(backend) if config.snapshot_interval > 0 => Some(spawn_snapshot_task(
            state.store.clone(),
            backend.clone(),
            config.snapshot_interval,
        )),
        _ => None,
    };

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = snapshot_handle {
        handle.abort();
        warn!("Snapshot task aborted");
    }

    // Final flush is awaited so it completes before the process exits
    if let Some(backend) = &state.backend {
        info!("Saving store before exit...");
        if let Err(e) = persistence::persist(&state.store, backend.as_ref()).await {
            warn!(error = %e, "final snapshot failed, data since the last snapshot is lost");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
}

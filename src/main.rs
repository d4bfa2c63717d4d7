//! offline-worker: serve a static site through an offline cache.
//!
//! Installs the worker against the configured origin (pre-caching the pinned
//! asset lists), activates it, then answers every browser request through it:
//!   pinned asset → cache-first, document → network-first,
//!   image → cache-first, everything else → network-first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use offline_worker::cache::persist::SnapshotStore;
use offline_worker::cache::storage::{new_shared_storage, CacheStorage};
use offline_worker::config::{Cli, Config};
use offline_worker::net::fetcher::HttpNetwork;
use offline_worker::server::metrics::Metrics;
use offline_worker::server::proxy::{build_router, AppState};
use offline_worker::worker::host::{ClientRegistry, NotificationCenter};
use offline_worker::ServiceWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "offline_worker=debug,tower_http=debug"
    } else {
        "offline_worker=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("offline-worker v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Arc::new(Config::load(&cli.config)?.with_cli_overrides(&cli));

    info!(
        origin = %config.server.origin,
        static_cache = %config.worker.static_cache_name(),
        dynamic_cache = %config.worker.dynamic_cache_name(),
        static_assets = config.worker.static_assets.len(),
        dynamic_assets = config.worker.dynamic_assets.len(),
        "Configuration loaded"
    );

    // Restore partitions from the last run, if persistence is enabled.
    let snapshots = config
        .storage
        .snapshot_dir
        .clone()
        .map(|dir| SnapshotStore::new(dir, &config.storage));
    let storage = match &snapshots {
        Some(store) => Arc::new(CacheStorage::from_partitions(store.load().await?)),
        None => new_shared_storage(),
    };

    let network = Arc::new(HttpNetwork::new(Duration::from_secs(
        config.server.request_timeout_secs,
    ))?);
    let clients = Arc::new(ClientRegistry::new());
    let notifications = Arc::new(NotificationCenter::new());

    let worker = Arc::new(
        ServiceWorker::new(config.clone(), storage, network)
            .with_clients(clients.clone())
            .with_notifier(notifications.clone()),
    );

    // Install (or adopt a previous install of this version), then activate.
    if !worker.adopt_existing_install().await {
        worker.install().await?;
    }
    if worker.skip_waiting_requested() {
        worker.activate().await?;
    } else {
        warn!("Worker installed but waiting; activate with a SKIP_WAITING message");
    }

    // Build application state.
    let state = Arc::new(AppState {
        worker: worker.clone(),
        clients,
        notifications,
        metrics: Metrics::new()?,
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen.clone();
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = snapshots {
        store.save(&worker.storage().export().await).await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

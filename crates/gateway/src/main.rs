//! Herdpulse gateway service.
//!
//! Wires the telemetry pipeline to the network:
//! - Opens the SQLite reading store and seeds the livestock registry
//! - Serves the ingestion API and the live dashboard WebSocket stream
//! - Runs the monitor loop and stops it on graceful shutdown

use std::sync::Arc;

use anyhow::Context;
use gateway::config::GatewayConfig;
use gateway::server::{build_router, AppState};
use notify::Notifier;
use telemetry::{Broadcaster, Ingestor, LiveCache, SqliteStore, TelemetryMonitor};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,telemetry=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Herdpulse gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = GatewayConfig::load();

    let store = Arc::new(
        SqliteStore::open(&config.database_path).context("failed to open the reading store")?,
    );
    for record in &config.livestock {
        store
            .register_livestock(record.clone())
            .await
            .with_context(|| format!("failed to register livestock {}", record.livestock_id))?;
    }
    let registered = store
        .livestock_count()
        .await
        .context("failed to query the livestock registry")?;
    info!(registered, "livestock registry ready");

    let cache = Arc::new(LiveCache::new());
    let broadcaster = Arc::new(Broadcaster::new());
    let notifier = Arc::new(Notifier::from_env());
    let ingestor = Arc::new(Ingestor::new(
        store.clone(),
        store.clone(),
        cache.clone(),
    ));
    let monitor = Arc::new(TelemetryMonitor::new(
        cache,
        broadcaster.clone(),
        notifier,
        config.thresholds,
        config.tick_interval(),
    ));

    let app = build_router(AppState {
        ingestor,
        store,
        broadcaster,
        monitor: monitor.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("Gateway listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.shutdown();
    info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}

use anyhow::Context;
use cache_system::CacheMonitor;
use pulseboard::{api, AppConfig, AppContext};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "pulseboard=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let address = config.server.bind_address();
    let monitor_interval = config.cache.monitor_interval();

    let context = AppContext::new(config).await.context("opening database")?;
    let monitor = monitor_interval.map(|interval| CacheMonitor::spawn(Arc::clone(context.cache()), interval));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, backend = %context.backend(), "pulseboard listening");

    axum::serve(listener, api::router(context.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    if let Some(monitor) = monitor {
        monitor.abort();
    }
    context.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

//! TakeHome Server Binary
//!
//! Serves the earnings calculator API over HTTP.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use takehome_fx::{FxEngine, HttpRateProvider, RateCache};
use takehome_ledger::PgStorage;
use takehome_server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting TakeHome server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }
    let addr = config.socket_addr().map_err(anyhow::Error::msg)?;

    // Rate feed and cache
    let provider = HttpRateProvider::new(config.rates.url.clone(), config.rates.fetch_timeout)?;
    info!(
        rates_url = provider.url(),
        freshness_window_secs = config.rates.freshness_window.as_secs(),
        "Rate feed configured"
    );
    if config.session.secret.is_none() {
        warn!("SESSION_SECRET unset, accepting unsigned session cookies");
    }
    let cache = RateCache::with_config(Arc::new(provider), config.rate_cache_config());
    let fx = FxEngine::new(Arc::new(cache));

    // Persistence
    let storage = PgStorage::connect(&config.database.url, config.database.max_connections).await?;
    storage.migrate().await?;
    info!(max_connections = config.database.max_connections, "Database ready");

    let state = AppState::new(config, fx, Arc::new(storage));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(listen_addr = %addr, "TakeHome server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("TakeHome server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received");
}

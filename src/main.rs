//! Main service entry point.
//!
//! Serves events, participation requests, comments and compilations, and
//! reports public reads to the statistics service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use explore_with_me::api;
use explore_with_me::app_state::AppState;
use explore_with_me::client::HttpStatsClient;
use explore_with_me::config::MainConfig;
use explore_with_me::domain::SystemClock;
use explore_with_me::persistence::{MemoryStore, PostgresStore, Store, postgres};
use explore_with_me::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = MainConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    telemetry::init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting ewm-main");

    // Build persistence layer
    let store: Arc<dyn Store> = if config.database.persistence_enabled {
        let pool = postgres::connect(&config.database)
            .await
            .context("connecting to the main database")?;
        let store = PostgresStore::new(pool);
        if config.database.run_migrations {
            store.migrate().await.context("migrating the main database")?;
        }
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, data lives in memory only");
        Arc::new(MemoryStore::new())
    };

    // Build service layer
    let stats = Arc::new(HttpStatsClient::new(
        &config.stats_server_url,
        config.stats_timeout,
    )?);
    let app_state = AppState::new(store, stats, Arc::new(SystemClock), &config.app_name);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, stats = %config.stats_server_url, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(telemetry::shutdown_signal())
    .await?;

    Ok(())
}

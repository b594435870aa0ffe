//! Statistics service entry point.
//!
//! Records endpoint hits and serves aggregated view counts.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use explore_with_me::api;
use explore_with_me::app_state::StatsState;
use explore_with_me::config::StatsConfig;
use explore_with_me::persistence::{HitStore, MemoryHitStore, PostgresHitStore, postgres};
use explore_with_me::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StatsConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    telemetry::init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting ewm-stats");

    let hits: Arc<dyn HitStore> = if config.database.persistence_enabled {
        let pool = postgres::connect(&config.database)
            .await
            .context("connecting to the statistics database")?;
        let store = PostgresHitStore::new(pool);
        if config.database.run_migrations {
            store
                .migrate()
                .await
                .context("migrating the statistics database")?;
        }
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, hits live in memory only");
        Arc::new(MemoryHitStore::new())
    };

    let app = Router::new()
        .merge(api::build_stats_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(StatsState::new(hits));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(telemetry::shutdown_signal())
    .await?;

    Ok(())
}

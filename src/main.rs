mod auth;
mod config;
mod middleware;

mod db;
mod error;
mod models;
mod repository;
mod routes;
mod scheduling;

use std::sync::Arc;

use crate::{
    config::Config,
    models::AppState,
    repository::PgStore,
    scheduling::{AccessService, BookingLocks, BookingService, ScheduleLifecycle},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_pg(&cfg.database_url, cfg.db_max_connections).await?;

    // One lock table shared by booking and schedule creation.
    let store = Arc::new(PgStore::new(pool.clone()));
    let locks = BookingLocks::with_advisory(pool.clone());

    let state = AppState {
        db: pool,
        session_ttl_hours: cfg.session_ttl_hours,
        booking: BookingService::new(store.clone(), store.clone(), locks.clone()),
        schedules: ScheduleLifecycle::new(store.clone(), locks),
        access: AccessService::new(store),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

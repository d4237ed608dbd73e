use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::models::AppState;

#[derive(Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/healthcheck", get(healthcheck))
}

/// Unauthenticated liveness probe.
pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthData> {
    let database = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    Json(HealthData {
        status: "available",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

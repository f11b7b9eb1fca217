//! Liveness and per-pool health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use depot_db::PoolHealth;
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub pools: PoolHealth,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let pools = state.router.health().await;
    let (status, label) = if pools.all_up() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthReport {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            pools,
        }),
    )
}

use std::time::Duration;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let uptime = Duration::from_secs(state.started.elapsed().as_secs());
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime: humantime::format_duration(uptime).to_string(),
    })
}

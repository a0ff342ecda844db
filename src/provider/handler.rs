use axum::{extract::State, Json};

use super::projection::project;
use super::schema::DynamicConfig;
use crate::http::server::AppState;

/// Serves the projected configuration polled by the gateway.
pub async fn provider_config(State(state): State<AppState>) -> Json<DynamicConfig> {
    let config = state.store.read(project);
    tracing::debug!(
        routers = config.http.routers.len(),
        services = config.http.services.len(),
        middlewares = config.http.middlewares.len(),
        "Serving provider configuration"
    );
    Json(config)
}

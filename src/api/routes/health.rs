//! Health Routes
//!
//! - GET /health/live - Liveness probe
//! - GET /health - Local state plus backend status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Always 200: a backend outage degrades the dashboard but does not stop it.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let service = &state.service;

    let (backend, models_loaded) = match service.backend_health().await {
        Ok(health) => (health.status, health.models_loaded),
        Err(e) => {
            tracing::debug!(error = %e, "Backend health check failed");
            ("unreachable".to_string(), false)
        }
    };
    let backend_ok = backend != "unreachable";

    Json(HealthResponse {
        status: if backend_ok { "healthy" } else { "degraded" }.to_string(),
        backend,
        models_loaded,
        push_connected: service.push_running().await,
        simulation_running: service.simulation_running().await,
        queue_size: service.read().await.records().len(),
        ws_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

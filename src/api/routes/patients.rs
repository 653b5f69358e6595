//! Patient Routes
//!
//! - GET /api/v1/patients/:id - Live record plus vitals trend
//! - GET /api/v1/patients/:id/history - Vitals trend only
//! - POST /api/v1/patients/:id/select - Select for the detail view
//! - GET /api/v1/selection, DELETE /api/v1/selection

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dashboard::{LiveDashboard, PatientDetail};
use crate::queue::{PatientId, VitalsSample};

fn resolve(dashboard: &LiveDashboard, key: &str) -> ApiResult<PatientId> {
    dashboard
        .resolve_id(key)
        .ok_or_else(|| ApiError::NotFound(format!("Patient '{}'", key)))
}

/// GET /api/v1/patients/:id
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<PatientDetail>> {
    let dashboard = state.service.read().await;
    let id = resolve(&dashboard, &key)?;
    dashboard
        .detail(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient '{}' is no longer queued", key)))
}

/// GET /api/v1/patients/:id/history
///
/// Patients that left the queue keep their history.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<VitalsSample>>> {
    let dashboard = state.service.read().await;
    let id = resolve(&dashboard, &key)?;
    Ok(Json(dashboard.history(&id)))
}

/// POST /api/v1/patients/:id/select
pub async fn select_patient(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<PatientDetail>> {
    let mut dashboard = state.service.write().await;
    let id = resolve(&dashboard, &key)?;
    dashboard
        .select(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient '{}' is no longer queued", key)))
}

/// GET /api/v1/selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> ApiResult<Json<PatientDetail>> {
    state
        .service
        .read()
        .await
        .selected()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No patient selected".to_string()))
}

/// DELETE /api/v1/selection
pub async fn clear_selection(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.write().await.clear_selection();
    StatusCode::NO_CONTENT
}

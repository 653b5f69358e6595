//! Doctor Directory Routes
//!
//! - GET /api/v1/doctors - Doctors grouped by department
//! - GET /api/v1/departments - Staffing per department
//! - POST /api/v1/doctors/availability - Set a doctor's availability

use axum::{extract::State, Json};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::backend::{AvailabilityResponse, AvailabilityUpdate, DepartmentStats, Doctor};

/// GET /api/v1/doctors
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BTreeMap<String, Vec<Doctor>>>> {
    Ok(Json(state.service.doctor_list().await?))
}

/// GET /api/v1/departments
pub async fn department_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BTreeMap<String, DepartmentStats>>> {
    Ok(Json(state.service.department_stats().await?))
}

/// POST /api/v1/doctors/availability
pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    Json(update): Json<AvailabilityUpdate>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let response = state
        .service
        .set_availability(&update.doctor_name, update.status)
        .await?;
    Ok(Json(response))
}

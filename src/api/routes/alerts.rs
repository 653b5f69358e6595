//! Alert Routes
//!
//! - POST /api/v1/alerts/emergency - Scan for the first critical patient
//! - GET /api/v1/notifications - Unexpired notifications

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::EmergencyResponse;
use crate::api::state::AppState;
use crate::notify::Notification;

/// POST /api/v1/alerts/emergency
pub async fn emergency_scan(State(state): State<Arc<AppState>>) -> Json<EmergencyResponse> {
    let (scan, detail) = state.service.emergency_alert().await;
    Json(EmergencyResponse::from_scan(scan, detail))
}

/// GET /api/v1/notifications
pub async fn list_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(state.service.write().await.notifications(Utc::now()))
}

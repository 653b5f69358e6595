//! Queue Routes
//!
//! - GET /api/v1/queue - Current page (or `?page=N` without moving)
//! - PUT /api/v1/queue/view - Change tab or doctor override
//! - POST /api/v1/queue/next, /queue/previous, /queue/page - Move the pager
//! - PUT /api/v1/session - Change the logged-in doctor

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PageRequest, QueueQuery, QueueViewResponse, SessionUpdate, ViewUpdate};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::queue::QueueError;

/// GET /api/v1/queue
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QueueQuery>,
) -> ApiResult<Json<QueueViewResponse>> {
    let dashboard = state.service.read().await;

    let response = match query.page {
        None => QueueViewResponse::current(&dashboard),
        Some(page) => {
            let total_pages = dashboard.total_pages();
            if page == 0 || page > total_pages.max(1) {
                return Err(QueueError::PageOutOfRange {
                    requested: page,
                    total_pages,
                }
                .into());
            }
            QueueViewResponse::new(&dashboard, dashboard.page_at(page))
        }
    };
    Ok(Json(response))
}

/// PUT /api/v1/queue/view
pub async fn update_view(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ViewUpdate>,
) -> Json<QueueViewResponse> {
    let mut dashboard = state.service.write().await;

    if let Some(tab) = update.tab {
        dashboard.set_tab(tab);
    }
    if let Some(doctor) = update.doctor {
        dashboard.set_doctor_override(doctor);
    }

    Json(QueueViewResponse::current(&dashboard))
}

/// POST /api/v1/queue/next
pub async fn next_page(State(state): State<Arc<AppState>>) -> ApiResult<Json<QueueViewResponse>> {
    let mut dashboard = state.service.write().await;
    let page = dashboard.next_page()?;
    Ok(Json(QueueViewResponse::new(&dashboard, page)))
}

/// POST /api/v1/queue/previous
pub async fn previous_page(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<QueueViewResponse>> {
    let mut dashboard = state.service.write().await;
    let page = dashboard.previous_page()?;
    Ok(Json(QueueViewResponse::new(&dashboard, page)))
}

/// POST /api/v1/queue/page
pub async fn go_to_page(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PageRequest>,
) -> ApiResult<Json<QueueViewResponse>> {
    let mut dashboard = state.service.write().await;
    let page = dashboard.go_to_page(req.page)?;
    Ok(Json(QueueViewResponse::new(&dashboard, page)))
}

/// PUT /api/v1/session
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SessionUpdate>,
) -> Json<QueueViewResponse> {
    let mut dashboard = state.service.write().await;
    dashboard.set_current_doctor(update.doctor);
    tracing::info!(doctor = ?dashboard.current_doctor(), "Session doctor changed");
    Json(QueueViewResponse::current(&dashboard))
}

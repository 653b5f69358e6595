//! Local View API
//!
//! HTTP API over the live dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Queue
//! - `GET /api/v1/queue` - Current page, counts and overview (`?page=N` to peek)
//! - `PUT /api/v1/queue/view` - Set tab and/or doctor override
//! - `POST /api/v1/queue/next` - Next page
//! - `POST /api/v1/queue/previous` - Previous page
//! - `POST /api/v1/queue/page` - Jump to a page
//! - `PUT /api/v1/session` - Set the logged-in doctor
//!
//! ## Patients
//! - `GET /api/v1/patients/:id` - Live record and vitals trend
//! - `GET /api/v1/patients/:id/history` - Vitals trend
//! - `POST /api/v1/patients/:id/select` - Select for the detail view
//! - `GET /api/v1/selection` / `DELETE /api/v1/selection`
//!
//! ## Alerts
//! - `POST /api/v1/alerts/emergency` - Emergency scan
//! - `GET /api/v1/notifications` - Active notifications
//!
//! ## Triage
//! - `POST /api/v1/triage` - Submit an intake form
//! - `POST /api/v1/triage/upload` - Upload a PDF (multipart)
//! - `GET /api/v1/chat` / `POST /api/v1/chat` - Assistant conversation
//! - `GET /api/v1/bias` - Fairness rows
//! - `GET /api/v1/simulation` / `POST /api/v1/simulation` - Arrival simulation
//!
//! ## Directory
//! - `GET /api/v1/doctors`, `GET /api/v1/departments`
//! - `POST /api/v1/doctors/availability`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status
//!
//! ## Relay
//! - `GET /api/v1/ws` - Queue, notification and vitals updates

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::websocket::websocket_handler;

/// Largest accepted document upload
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.service.config().api.request_timeout_secs.max(1));

    let api_routes = Router::new()
        // Queue
        .route("/queue", get(routes::queue::get_queue))
        .route("/queue/view", put(routes::queue::update_view))
        .route("/queue/next", post(routes::queue::next_page))
        .route("/queue/previous", post(routes::queue::previous_page))
        .route("/queue/page", post(routes::queue::go_to_page))
        .route("/session", put(routes::queue::update_session))
        // Patients
        .route("/patients/:id", get(routes::patients::get_patient))
        .route("/patients/:id/history", get(routes::patients::get_history))
        .route("/patients/:id/select", post(routes::patients::select_patient))
        .route(
            "/selection",
            get(routes::patients::get_selection).delete(routes::patients::clear_selection),
        )
        // Alerts
        .route("/alerts/emergency", post(routes::alerts::emergency_scan))
        .route("/notifications", get(routes::alerts::list_notifications))
        // Triage
        .route("/triage", post(routes::triage::submit_triage))
        .route(
            "/triage/upload",
            post(routes::triage::upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/chat",
            get(routes::triage::chat_history).post(routes::triage::chat),
        )
        .route("/bias", get(routes::triage::bias_report))
        .route(
            "/simulation",
            get(routes::triage::simulation_status).post(routes::triage::toggle_simulation),
        )
        // Directory
        .route("/doctors", get(routes::directory::list_doctors))
        .route("/departments", get(routes::directory::department_stats))
        .route("/doctors/availability", post(routes::directory::set_availability))
        // Relay
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server; returns after a shutdown signal
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Triage view API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Triage view API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

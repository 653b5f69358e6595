//! Triage Routes
//!
//! - POST /api/v1/triage - Validate, predict and admit a patient
//! - POST /api/v1/triage/upload - Extract vitals from a PDF (multipart)
//! - GET/POST /api/v1/chat - Assistant conversation
//! - GET /api/v1/bias - Fairness rows
//! - GET/POST /api/v1/simulation - Arrival simulation status and toggle

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ChatRequestBody, SimulationStatus, UploadResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::backend::{BiasReport, ChatMessage, IntakeForm};
use crate::queue::PatientRecord;

/// POST /api/v1/triage
pub async fn submit_triage(
    State(state): State<Arc<AppState>>,
    Json(form): Json<IntakeForm>,
) -> ApiResult<(StatusCode, Json<PatientRecord>)> {
    let record = state.service.submit_triage(&form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/v1/triage/upload
///
/// Parts: `file` (the PDF) and an optional `form` holding the current
/// form as JSON. The merged form is returned for the client to show.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut form = IntakeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let part = field.name().unwrap_or_default().to_string();
        match part.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e)))?;
                file = Some((name, bytes.to_vec()));
            }
            "form" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read form: {}", e)))?;
                form = serde_json::from_str(&text)
                    .map_err(|e| ApiError::Validation(format!("Invalid form: {}", e)))?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::Validation("Missing 'file' part".to_string()))?;

    let extraction = state
        .service
        .upload_document(&mut form, &file_name, bytes)
        .await?;

    tracing::info!(file = %file_name, "Document processed");
    Ok(Json(UploadResponse { extraction, form }))
}

/// POST /api/v1/chat
///
/// Backend failures answer with the fallback message instead of an error.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequestBody>,
) -> ApiResult<Json<ChatMessage>> {
    state
        .service
        .chat(&req.message)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::Validation("Message must not be empty".to_string()))
}

/// GET /api/v1/chat
pub async fn chat_history(State(state): State<Arc<AppState>>) -> Json<Vec<ChatMessage>> {
    Json(state.service.chat_history().await)
}

/// GET /api/v1/bias
pub async fn bias_report(State(state): State<Arc<AppState>>) -> ApiResult<Json<BiasReport>> {
    Ok(Json(state.service.bias_report().await?))
}

/// GET /api/v1/simulation
pub async fn simulation_status(State(state): State<Arc<AppState>>) -> Json<SimulationStatus> {
    Json(SimulationStatus {
        running: state.service.simulation_running().await,
    })
}

/// POST /api/v1/simulation
pub async fn toggle_simulation(State(state): State<Arc<AppState>>) -> Json<SimulationStatus> {
    let running = state.service.toggle_simulation().await;
    tracing::info!(running, "Arrival simulation toggled");
    Json(SimulationStatus { running })
}

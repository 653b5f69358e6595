//! Triage Backend Integration
//!
//! Everything that needs a model, a PDF parser or an LLM is done by the
//! remote triage backend. This module wraps it:
//!
//! - **Client**: REST client implementing [`TriageBackend`]
//! - **Intake**: Form validation and document merge for new triage requests
//! - **Chat**: Conversation state for the triage assistant
//! - **Bias**: Reshaping of the fairness statistics into chart rows

mod bias;
mod chat;
mod client;
mod dto;
mod intake;

#[cfg(test)]
pub(crate) mod testing;

pub use bias::{bias_rows, BiasReport, BiasRow};
pub use chat::{ChatSession, CHAT_FALLBACK_MESSAGE};
pub use client::{BackendError, TriageClient};
pub use dto::{
    Availability, AvailabilityResponse, AvailabilityUpdate, BackendHealth, BiasStats,
    ChatMessage, ChatRequest, ChatResponse, DepartmentStats, DocumentExtraction, Doctor,
    ExtractedVitals, NestedCounts, PredictRequest, PredictResponse,
};
pub use intake::{ensure_pdf, record_from_prediction, IntakeError, IntakeForm};

use crate::queue::PatientRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Operations the triage backend provides
#[async_trait]
pub trait TriageBackend: Send + Sync {
    /// Backend liveness and model status
    async fn health(&self) -> Result<BackendHealth, BackendError>;

    /// Current queue for the initial load
    async fn fetch_patients(&self) -> Result<Vec<PatientRecord>, BackendError>;

    /// Ask for a simulated arrival; `None` when the backend has nothing to offer
    async fn simulate_arrival(&self) -> Result<Option<PatientRecord>, BackendError>;

    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, BackendError>;

    /// Upload a PDF for vitals extraction
    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentExtraction, BackendError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;

    async fn bias_stats(&self) -> Result<BiasStats, BackendError>;

    async fn department_stats(&self) -> Result<BTreeMap<String, DepartmentStats>, BackendError>;

    /// Doctors grouped by department
    async fn doctor_list(&self) -> Result<BTreeMap<String, Vec<Doctor>>, BackendError>;

    async fn set_availability(
        &self,
        doctor_name: &str,
        status: Availability,
    ) -> Result<AvailabilityResponse, BackendError>;
}

//! Data Transfer Objects
//!
//! Request and response bodies of the local view API.

use crate::backend::{DocumentExtraction, IntakeForm};
use crate::dashboard::{LiveDashboard, PatientDetail};
use crate::notify::{EmergencyScan, Notification};
use crate::queue::{DoctorOverview, QueuePage, QueueTab, TabCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// QUEUE DTOs
// ============================================

/// The page being shown plus everything drawn around it
#[derive(Debug, Serialize)]
pub struct QueueViewResponse {
    #[serde(flatten)]
    pub page: QueuePage,
    pub tab: QueueTab,
    pub doctor_override: Option<String>,
    pub current_doctor: Option<String>,
    pub counts: TabCounts,
    pub overview: Option<DoctorOverview>,
    pub has_emergency: bool,
    pub version: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueueViewResponse {
    pub fn new(dashboard: &LiveDashboard, page: QueuePage) -> Self {
        Self {
            page,
            tab: dashboard.filter().tab,
            doctor_override: dashboard.filter().doctor.clone(),
            current_doctor: dashboard.current_doctor().map(str::to_string),
            counts: dashboard.tab_counts(),
            overview: dashboard.doctor_overview(),
            has_emergency: dashboard.has_emergency(),
            version: dashboard.version(),
            updated_at: dashboard.updated_at(),
        }
    }

    pub fn current(dashboard: &LiveDashboard) -> Self {
        Self::new(dashboard, dashboard.page())
    }
}

/// `GET /queue?page=N` peeks at a page without moving the pager
#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    pub page: Option<u32>,
}

/// Change of the view filter.
///
/// `doctor` absent leaves the override alone; `null` or `""` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct ViewUpdate {
    #[serde(default)]
    pub tab: Option<QueueTab>,
    #[serde(default, deserialize_with = "present")]
    pub doctor: Option<Option<String>>,
}

/// Distinguish a missing field from an explicit null
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct SessionUpdate {
    pub doctor: Option<String>,
}

// ============================================
// ALERT DTOs
// ============================================

#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EmergencyResponse {
    Critical { patient: PatientDetail, notification: Notification },
    NoCriticalPatients { message: String },
}

impl EmergencyResponse {
    pub fn from_scan(scan: EmergencyScan, detail: Option<PatientDetail>) -> Self {
        match (scan, detail) {
            (EmergencyScan::Critical { notification, .. }, Some(patient)) => {
                EmergencyResponse::Critical {
                    patient,
                    notification,
                }
            }
            (EmergencyScan::Critical { patient, notification }, None) => {
                EmergencyResponse::Critical {
                    patient: PatientDetail {
                        record: patient,
                        history: Vec::new(),
                    },
                    notification,
                }
            }
            (EmergencyScan::NoCriticalPatients, _) => EmergencyResponse::NoCriticalPatients {
                message: "No critical patients at the moment".to_string(),
            },
        }
    }
}

// ============================================
// TRIAGE DTOs
// ============================================

/// Result of a document upload: what was found and the merged form
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub extraction: DocumentExtraction,
    pub form: IntakeForm,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SimulationStatus {
    pub running: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Backend status, "unreachable" when it could not be asked
    pub backend: String,
    pub models_loaded: bool,
    pub push_connected: bool,
    pub simulation_running: bool,
    pub queue_size: usize,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

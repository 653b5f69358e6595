//! In-memory backend used by unit tests

use super::dto::*;
use super::{BackendError, TriageBackend};
use crate::queue::PatientRecord;
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeBackend {
    pub patients: Mutex<Vec<PatientRecord>>,
    pub arrivals: Mutex<VecDeque<PatientRecord>>,
    pub prediction: Mutex<Option<PredictResponse>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub offline: AtomicBool,
    pub predict_calls: AtomicUsize,
    pub arrival_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_patients(patients: Vec<PatientRecord>) -> Self {
        let backend = Self::default();
        *backend.patients.lock().unwrap() = patients;
        backend
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn queue_arrival(&self, record: PatientRecord) {
        self.arrivals.lock().unwrap().push_back(record);
    }

    pub fn set_prediction(&self, response: PredictResponse) {
        *self.prediction.lock().unwrap() = Some(response);
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(BackendError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn doctors() -> Vec<Doctor> {
        vec![
            Doctor {
                id: "cardio_1".into(),
                name: "Dr. Heart".into(),
                dept: "Cardiology".into(),
                status: "Available".into(),
                spec: Some("Interventional Cardiology".into()),
            },
            Doctor {
                id: "neuro_1".into(),
                name: "Dr. Brain".into(),
                dept: "Neurology".into(),
                status: "Busy".into(),
                spec: Some("Stroke Specialist".into()),
            },
        ]
    }
}

#[async_trait]
impl TriageBackend for FakeBackend {
    async fn health(&self) -> Result<BackendHealth, BackendError> {
        self.check()?;
        Ok(BackendHealth {
            status: "active".into(),
            models_loaded: true,
        })
    }

    async fn fetch_patients(&self) -> Result<Vec<PatientRecord>, BackendError> {
        self.check()?;
        Ok(self.patients.lock().unwrap().clone())
    }

    async fn simulate_arrival(&self) -> Result<Option<PatientRecord>, BackendError> {
        self.check()?;
        self.arrival_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.arrivals.lock().unwrap().pop_front())
    }

    async fn predict(&self, _request: &PredictRequest) -> Result<PredictResponse, BackendError> {
        self.check()?;
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        self.prediction
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::ApiError {
                status: 500,
                message: "Models not loaded".into(),
            })
    }

    async fn upload_document(
        &self,
        _file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<DocumentExtraction, BackendError> {
        self.check()?;
        Ok(DocumentExtraction {
            extracted_text_preview: "Age: 70".into(),
            extracted_data: ExtractedVitals {
                age: Some(70),
                heart_rate: Some(120),
                ..ExtractedVitals::default()
            },
            medical_notes: "Age: 70 HR: 120".into(),
        })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        self.check()?;
        self.chat_requests.lock().unwrap().push(request.clone());
        Ok(ChatResponse {
            response: format!("echo: {}", request.message),
        })
    }

    async fn bias_stats(&self) -> Result<BiasStats, BackendError> {
        self.check()?;
        Ok(serde_json::from_value(serde_json::json!({
            "gender_risk": {"High": {"Female": 2, "Male": 3}, "Low": {"Female": 5}},
            "age_risk": {"High": {"65+": 4}}
        }))
        .unwrap())
    }

    async fn department_stats(&self) -> Result<BTreeMap<String, DepartmentStats>, BackendError> {
        self.check()?;
        let mut stats = BTreeMap::new();
        for doctor in Self::doctors() {
            let entry = stats.entry(doctor.dept.clone()).or_insert(DepartmentStats {
                total: 0,
                available: 0,
                specs: Vec::new(),
            });
            entry.total += 1;
            if doctor.status == "Available" {
                entry.available += 1;
            }
            entry.specs.extend(doctor.spec);
        }
        Ok(stats)
    }

    async fn doctor_list(&self) -> Result<BTreeMap<String, Vec<Doctor>>, BackendError> {
        self.check()?;
        let mut grouped: BTreeMap<String, Vec<Doctor>> = BTreeMap::new();
        for doctor in Self::doctors() {
            grouped.entry(doctor.dept.clone()).or_default().push(doctor);
        }
        Ok(grouped)
    }

    async fn set_availability(
        &self,
        doctor_name: &str,
        status: Availability,
    ) -> Result<AvailabilityResponse, BackendError> {
        self.check()?;
        if Self::doctors().iter().any(|d| d.name == doctor_name) {
            Ok(AvailabilityResponse {
                status: "success".into(),
                new_state: status,
            })
        } else {
            Err(BackendError::ApiError {
                status: 404,
                message: "Doctor not found".into(),
            })
        }
    }
}

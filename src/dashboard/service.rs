//! Dashboard service
//!
//! Wires the live dashboard to the outside world:
//! - a single apply loop consuming feed events in receipt order
//! - the push subscription and arrival simulator as owned tasks
//! - user actions that go through the backend (triage, upload, chat, directory)
//! - a broadcast of every applied update for relay subscribers

use super::events::{DashboardUpdate, FeedEvent};
use super::live::{LiveDashboard, PatientDetail};
use super::simulator;
use crate::backend::{
    ensure_pdf, record_from_prediction, Availability, AvailabilityResponse,
    BackendError, BackendHealth, BiasReport, ChatMessage, ChatSession, DepartmentStats,
    DocumentExtraction, Doctor, IntakeError, IntakeForm, TriageBackend,
};
use crate::config::Config;
use crate::notify::EmergencyScan;
use crate::queue::PatientRecord;
use crate::tasks::TaskGuard;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

const EVENT_BUFFER: usize = 256;
const UPDATE_BUFFER: usize = 1024;

/// Errors from user actions that reach the backend
#[derive(Error, Debug)]
pub enum TriageError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Default)]
struct Tasks {
    push: Option<TaskGuard>,
    simulator: Option<TaskGuard>,
}

/// Shared dashboard plus its background tasks
pub struct DashboardService {
    config: Config,
    backend: Arc<dyn TriageBackend>,
    dashboard: Arc<RwLock<LiveDashboard>>,
    events: mpsc::Sender<FeedEvent>,
    updates: broadcast::Sender<DashboardUpdate>,
    chat: Mutex<ChatSession>,
    apply: Mutex<Option<TaskGuard>>,
    tasks: Mutex<Tasks>,
}

impl DashboardService {
    /// Create the service and start its apply loop. Must run inside a Tokio runtime.
    pub fn new(config: Config, backend: Arc<dyn TriageBackend>) -> Self {
        let (events, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        let dashboard = Arc::new(RwLock::new(LiveDashboard::new(&config)));

        let apply = TaskGuard::spawn(
            "apply",
            apply_loop(events_rx, Arc::clone(&dashboard), updates.clone()),
        );

        Self {
            config,
            backend,
            dashboard,
            events,
            updates,
            chat: Mutex::new(ChatSession::new()),
            apply: Mutex::new(Some(apply)),
            tasks: Mutex::new(Tasks::default()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn TriageBackend> {
        &self.backend
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, LiveDashboard> {
        self.dashboard.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, LiveDashboard> {
        self.dashboard.write().await
    }

    /// Receive every update applied from now on
    pub fn subscribe_updates(&self) -> broadcast::Receiver<DashboardUpdate> {
        self.updates.subscribe()
    }

    /// Queue an event for the apply loop
    pub async fn submit(&self, event: FeedEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    fn publish(&self, updates: Vec<DashboardUpdate>) {
        for update in updates {
            // No subscribers is fine
            let _ = self.updates.send(update);
        }
    }

    // ---- lifecycle ----

    /// Seed the queue from the backend
    pub async fn initial_load(&self) -> Result<usize, BackendError> {
        let records = self.backend.fetch_patients().await?;
        let count = records.len();

        let updates = self.dashboard.write().await.load_initial(records);
        self.publish(updates);

        tracing::info!(count, "Initial queue loaded");
        Ok(count)
    }

    /// Subscribe to the push channel if enabled. Returns whether it is running.
    pub async fn start_push(&self) -> bool {
        if !self.config.push.enabled {
            tracing::info!("Push channel disabled");
            return false;
        }

        let mut tasks = self.tasks.lock().await;
        if tasks.push.is_none() {
            tasks.push = Some(crate::push::subscribe(
                self.config.push.clone(),
                self.events.clone(),
            ));
        }
        true
    }

    pub async fn start_simulation(&self) {
        let mut tasks = self.tasks.lock().await;
        if tasks.simulator.is_none() {
            tasks.simulator = Some(simulator::spawn(
                Arc::clone(&self.backend),
                self.config.simulation.interval_ms,
                self.events.clone(),
            ));
        }
    }

    pub async fn stop_simulation(&self) {
        let guard = self.tasks.lock().await.simulator.take();
        if let Some(guard) = guard {
            guard.stop().await;
            tracing::info!("Arrival simulation stopped");
        }
    }

    pub async fn simulation_running(&self) -> bool {
        self.tasks.lock().await.simulator.is_some()
    }

    /// Flip the simulator on or off; returns the new state
    pub async fn toggle_simulation(&self) -> bool {
        if self.simulation_running().await {
            self.stop_simulation().await;
            false
        } else {
            self.start_simulation().await;
            true
        }
    }

    pub async fn push_running(&self) -> bool {
        self.tasks
            .lock()
            .await
            .push
            .as_ref()
            .map(|guard| !guard.is_finished())
            .unwrap_or(false)
    }

    /// Tear down every background task
    pub async fn shutdown(&self) {
        let (push, simulator) = {
            let mut tasks = self.tasks.lock().await;
            (tasks.push.take(), tasks.simulator.take())
        };
        for guard in [push, simulator].into_iter().flatten() {
            guard.stop().await;
        }
        if let Some(apply) = self.apply.lock().await.take() {
            apply.stop().await;
        }
        tracing::info!("Dashboard tasks stopped");
    }

    // ---- user actions ----

    /// Scan for the first critical patient in the current scope
    pub async fn emergency_scan(&self) -> EmergencyScan {
        self.emergency_alert().await.0
    }

    /// Scan and read the found patient's detail under one lock, so a
    /// snapshot cannot land between the two
    pub async fn emergency_alert(&self) -> (EmergencyScan, Option<PatientDetail>) {
        let (result, detail) = {
            let mut dashboard = self.dashboard.write().await;
            let result = dashboard.emergency_scan(Utc::now());
            let detail = match &result {
                EmergencyScan::Critical { patient, .. } => dashboard.detail(&patient.id),
                EmergencyScan::NoCriticalPatients => None,
            };
            (result, detail)
        };

        if let EmergencyScan::Critical { notification, .. } = &result {
            self.publish(vec![DashboardUpdate::Notifications {
                notifications: vec![notification.clone()],
            }]);
        }
        (result, detail)
    }

    /// Validate the form, run a prediction and admit the triaged patient
    pub async fn submit_triage(&self, form: &IntakeForm) -> Result<PatientRecord, TriageError> {
        let request = form.validate()?;
        let response = self.backend.predict(&request).await?;
        let record = record_from_prediction(&request, &response, Utc::now())?;

        tracing::info!(
            patient_id = %record.id,
            risk = ?response.predicted_risk,
            doctor = ?response.assigned_doctor,
            "Patient triaged"
        );

        let updates = self.dashboard.write().await.admit(record.clone(), Utc::now());
        self.publish(updates);
        Ok(record)
    }

    /// Extract vitals from a PDF and merge them into `form`
    pub async fn upload_document(
        &self,
        form: &mut IntakeForm,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentExtraction, TriageError> {
        ensure_pdf(file_name)?;
        let extraction = self.backend.upload_document(file_name, bytes).await?;
        form.merge_extracted(&extraction);
        Ok(extraction)
    }

    pub async fn chat(&self, message: &str) -> Option<ChatMessage> {
        let mut session = self.chat.lock().await;
        session.send(self.backend.as_ref(), message).await.cloned()
    }

    pub async fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.lock().await.messages().to_vec()
    }

    pub async fn bias_report(&self) -> Result<BiasReport, BackendError> {
        let stats = self.backend.bias_stats().await?;
        Ok(BiasReport::from(&stats))
    }

    pub async fn department_stats(&self) -> Result<BTreeMap<String, DepartmentStats>, BackendError> {
        self.backend.department_stats().await
    }

    pub async fn doctor_list(&self) -> Result<BTreeMap<String, Vec<Doctor>>, BackendError> {
        self.backend.doctor_list().await
    }

    pub async fn set_availability(
        &self,
        doctor_name: &str,
        status: Availability,
    ) -> Result<AvailabilityResponse, BackendError> {
        let response = self.backend.set_availability(doctor_name, status).await?;
        tracing::info!(doctor = doctor_name, status = status.as_str(), "Availability changed");
        Ok(response)
    }

    pub async fn backend_health(&self) -> Result<BackendHealth, BackendError> {
        self.backend.health().await
    }
}

async fn apply_loop(
    mut events: mpsc::Receiver<FeedEvent>,
    dashboard: Arc<RwLock<LiveDashboard>>,
    updates: broadcast::Sender<DashboardUpdate>,
) {
    while let Some(event) = events.recv().await {
        let applied = dashboard.write().await.apply(event);
        for update in applied {
            let _ = updates.send(update);
        }
    }
    tracing::debug!("Apply loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{PredictResponse, CHAT_FALLBACK_MESSAGE};
    use crate::backend::testing::FakeBackend;
    use crate::queue::{PatientId, QueueTab};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn service_with(backend: Arc<FakeBackend>) -> DashboardService {
        let mut config = Config::default();
        config.simulation.interval_ms = 10;
        config.push.enabled = false;
        DashboardService::new(config, backend)
    }

    async fn wait_for_version(service: &DashboardService, version: u64) {
        for _ in 0..100 {
            if service.read().await.version() >= version {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("version {} never reached", version);
    }

    fn prediction() -> PredictResponse {
        serde_json::from_value(serde_json::json!({
            "Predicted_Risk": "High",
            "Risk_Confidence": 93.0,
            "Department": "Cardiology",
            "Assigned_Doctor": "Dr. Heart",
            "explanation": ["Heart_Rate"]
        }))
        .unwrap()
    }

    fn valid_form() -> IntakeForm {
        IntakeForm {
            age: "60".into(),
            bp_systolic: "150".into(),
            bp_diastolic: "95".into(),
            heart_rate: "120".into(),
            temperature: "37.9".into(),
            o2_saturation: "92".into(),
            symptoms: "chest pain".into(),
            ..IntakeForm::default()
        }
    }

    #[tokio::test]
    async fn test_events_applied_in_order() {
        let service = service_with(Arc::new(FakeBackend::default()));
        let mut updates = service.subscribe_updates();

        service
            .submit(FeedEvent::snapshot(vec![PatientRecord::new(1)]))
            .await;
        service
            .submit(FeedEvent::snapshot(vec![PatientRecord::new(2), PatientRecord::new(3)]))
            .await;
        wait_for_version(&service, 2).await;

        let dashboard = service.read().await;
        let ids: Vec<PatientId> = dashboard.records().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![PatientId::from(2), PatientId::from(3)]);
        drop(dashboard);

        match updates.recv().await.unwrap() {
            DashboardUpdate::QueueReplaced { version, count } => {
                assert_eq!((version, count), (1, 1));
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initial_load_failure_keeps_state() {
        let backend = Arc::new(FakeBackend::with_patients(vec![PatientRecord::new(1)]));
        let service = service_with(backend.clone());

        assert_eq!(service.initial_load().await.unwrap(), 1);

        backend.set_offline(true);
        assert!(matches!(
            service.initial_load().await,
            Err(BackendError::Unavailable)
        ));
        assert_eq!(service.read().await.records().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_triage_admits_record() {
        let backend = Arc::new(FakeBackend::with_patients(vec![PatientRecord::new(1)]));
        backend.set_prediction(prediction());
        let service = service_with(backend.clone());
        service.initial_load().await.unwrap();

        let record = service.submit_triage(&valid_form()).await.unwrap();

        let mut dashboard = service.write().await;
        assert_eq!(dashboard.records()[0].id, record.id);
        assert!(matches!(record.id, PatientId::Text(_)));
        assert!(record.is_high_risk());

        let notifications = dashboard.notifications(Utc::now());
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "New Patient Triage: Anonymous");
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_prediction(prediction());
        let service = service_with(backend.clone());

        let form = IntakeForm {
            heart_rate: "fast".into(),
            ..valid_form()
        };
        let result = service.submit_triage(&form).await;

        assert!(matches!(
            result,
            Err(TriageError::Intake(IntakeError::NotNumeric { field: "Heart_Rate", .. }))
        ));
        assert_eq!(backend.predict_calls.load(Ordering::SeqCst), 0);
        assert!(service.read().await.records().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let service = service_with(Arc::new(FakeBackend::default()));
        let mut form = IntakeForm::default();

        let result = service
            .upload_document(&mut form, "notes.txt", b"Age: 70".to_vec())
            .await;
        assert!(matches!(result, Err(TriageError::Intake(IntakeError::NotPdf(_)))));

        service
            .upload_document(&mut form, "referral.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        assert_eq!(form.age, "70");
        assert_eq!(form.heart_rate, "120");
        assert_eq!(form.medical_notes, "Age: 70 HR: 120");
    }

    #[tokio::test]
    async fn test_simulation_toggle_and_arrivals() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_arrival(PatientRecord::new(55555).name("Alex Garcia"));
        let service = service_with(backend);

        assert!(service.toggle_simulation().await);
        wait_for_version(&service, 1).await;
        assert!(!service.toggle_simulation().await);
        assert!(!service.simulation_running().await);

        let mut dashboard = service.write().await;
        assert_eq!(dashboard.records()[0].id, PatientId::from(55555));
        assert_eq!(
            dashboard.notifications(Utc::now())[0].message,
            "New Patient Triage: Alex Garcia"
        );
    }

    #[tokio::test]
    async fn test_emergency_scan_publishes_notification() {
        let backend = Arc::new(FakeBackend::with_patients(vec![
            PatientRecord::new(1).risk_level("Low"),
            PatientRecord::new(2).name("Ravi").risk_level("High"),
        ]));
        let service = service_with(backend);
        service.initial_load().await.unwrap();
        service.write().await.set_tab(QueueTab::All);

        let mut updates = service.subscribe_updates();
        assert!(matches!(
            service.emergency_scan().await,
            EmergencyScan::Critical { .. }
        ));
        match updates.recv().await.unwrap() {
            DashboardUpdate::Notifications { notifications } => {
                assert_eq!(notifications[0].message, "CRITICAL: Emergency Alert for Ravi!")
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_emergency_alert_returns_live_detail() {
        let service = service_with(Arc::new(FakeBackend::default()));
        service.write().await.set_tab(QueueTab::All);
        for _ in 0..2 {
            service
                .submit(FeedEvent::snapshot(vec![
                    PatientRecord::new(1).risk_level("Low"),
                    PatientRecord::new(2).name("Ravi").risk_level("High"),
                ]))
                .await;
        }
        wait_for_version(&service, 2).await;

        let (scan, detail) = service.emergency_alert().await;
        let detail = detail.unwrap();
        match scan {
            EmergencyScan::Critical { patient, .. } => assert_eq!(patient.id, detail.record.id),
            EmergencyScan::NoCriticalPatients => panic!("expected a critical patient"),
        }
        assert_eq!(detail.history.len(), 2);

        service.write().await.load_initial(vec![PatientRecord::new(1).risk_level("Low")]);
        let (scan, detail) = service.emergency_alert().await;
        assert_eq!(scan, EmergencyScan::NoCriticalPatients);
        assert!(detail.is_none());
    }

    #[tokio::test]
    async fn test_chat_fallback_and_directory() {
        let backend = Arc::new(FakeBackend::default());
        let service = service_with(backend.clone());

        let reply = service.chat("hello").await.unwrap();
        assert_eq!(reply.content, "echo: hello");

        backend.set_offline(true);
        let reply = service.chat("still there?").await.unwrap();
        assert_eq!(reply.content, CHAT_FALLBACK_MESSAGE);
        assert_eq!(service.chat_history().await.len(), 4);

        backend.set_offline(false);
        let doctors = service.doctor_list().await.unwrap();
        assert_eq!(doctors["Cardiology"][0].name, "Dr. Heart");
        let report = service.bias_report().await.unwrap();
        assert_eq!(report.gender.len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_tasks() {
        let service = service_with(Arc::new(FakeBackend::default()));
        service.start_simulation().await;
        service.shutdown().await;

        assert!(!service.simulation_running().await);
        assert!(!service.submit(FeedEvent::snapshot(vec![])).await);
    }
}

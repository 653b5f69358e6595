//! Live dashboard state
//!
//! Owns the queue store, vitals history, notification emitter and view state,
//! and applies feed events and user actions to them. Every method returns the
//! updates it produced so the caller can publish them.

use super::events::{DashboardUpdate, FeedEvent, PatientSample};
use crate::config::Config;
use crate::notify::{has_emergency, EmergencyScan, Notification, NotificationEmitter, ScanScope};
use crate::queue::{
    compute_page, total_pages, DoctorOverview, Pager, PatientId, PatientRecord, QueueFilter,
    QueuePage, QueueResult, QueueStore, QueueTab, TabCounts, VitalsHistory, VitalsSample,
    filter_records,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Selected patient with their vitals trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientDetail {
    pub record: PatientRecord,
    pub history: Vec<VitalsSample>,
}

/// Queue state plus the view a single dashboard session is looking at
#[derive(Debug)]
pub struct LiveDashboard {
    store: QueueStore,
    history: VitalsHistory,
    emitter: NotificationEmitter,
    filter: QueueFilter,
    pager: Pager,
    page_size: usize,
    current_doctor: Option<String>,
    selected: Option<PatientId>,
}

impl Default for LiveDashboard {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl LiveDashboard {
    pub fn new(config: &Config) -> Self {
        Self {
            store: QueueStore::new(),
            history: VitalsHistory::new(config.queue.history_capacity),
            emitter: NotificationEmitter::new(
                config.notifications.arrival_ttl_ms,
                config.notifications.critical_ttl_ms,
            ),
            filter: QueueFilter::default(),
            pager: Pager::new(),
            page_size: config.queue.page_size.max(1),
            current_doctor: config.session.doctor.clone(),
            selected: None,
        }
    }

    // ---- feed ----

    /// Seed the queue from `GET /patients`. Known ids become the arrival baseline;
    /// no vitals are sampled.
    pub fn load_initial(&mut self, records: Vec<PatientRecord>) -> Vec<DashboardUpdate> {
        self.emitter.mark_baseline(&records);
        self.store.replace(records);
        vec![self.queue_replaced()]
    }

    /// Apply one event from the feed
    pub fn apply(&mut self, event: FeedEvent) -> Vec<DashboardUpdate> {
        match event {
            FeedEvent::Snapshot {
                records,
                received_at,
            } => self.apply_snapshot(records, received_at),
            FeedEvent::Arrival {
                record,
                received_at,
            } => self.admit(record, received_at),
        }
    }

    fn apply_snapshot(
        &mut self,
        records: Vec<PatientRecord>,
        now: DateTime<Utc>,
    ) -> Vec<DashboardUpdate> {
        self.history.record(&records, now);

        let arrivals = self.emitter.observe_snapshot(&records, now);
        let samples = records
            .iter()
            .map(|record| PatientSample {
                patient_id: record.id.clone(),
                sample: VitalsSample::from_record(record, now),
            })
            .collect();

        let mut updates = Vec::with_capacity(3);
        if !arrivals.is_empty() {
            updates.push(DashboardUpdate::Notifications {
                notifications: arrivals,
            });
        }
        updates.push(DashboardUpdate::VitalsRecorded {
            received_at: now,
            samples,
        });

        self.store.replace(records);
        updates.insert(0, self.queue_replaced());

        tracing::debug!(
            version = self.store.version(),
            count = self.store.len(),
            "Snapshot applied"
        );
        updates
    }

    /// Put a new record at the head of the queue and announce it if unseen
    pub fn admit(&mut self, record: PatientRecord, now: DateTime<Utc>) -> Vec<DashboardUpdate> {
        let notification = self.emitter.observe_arrival(&record, now);
        tracing::info!(patient_id = %record.id, "Patient admitted");
        self.store.admit(record);

        let mut updates = vec![self.queue_replaced()];
        updates.extend(notification.map(|n| DashboardUpdate::Notifications {
            notifications: vec![n],
        }));
        updates
    }

    fn queue_replaced(&self) -> DashboardUpdate {
        DashboardUpdate::QueueReplaced {
            version: self.store.version(),
            count: self.store.len(),
        }
    }

    // ---- view ----

    pub fn records(&self) -> &[PatientRecord] {
        self.store.get()
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.store.updated_at()
    }

    pub fn filter(&self) -> &QueueFilter {
        &self.filter
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.pager.current()
    }

    pub fn current_doctor(&self) -> Option<&str> {
        self.current_doctor.as_deref()
    }

    /// Change who is logged in; the view starts over at page 1
    pub fn set_current_doctor(&mut self, doctor: Option<String>) {
        self.current_doctor = doctor.filter(|d| !d.trim().is_empty());
        self.pager.reset();
    }

    /// Page currently shown
    pub fn page(&self) -> QueuePage {
        self.page_at(self.pager.current())
    }

    /// Any page of the current view, without moving the pager
    pub fn page_at(&self, page: u32) -> QueuePage {
        compute_page(
            self.store.get(),
            &self.filter,
            self.current_doctor.as_deref(),
            page,
            self.page_size,
        )
    }

    pub fn total_pages(&self) -> u32 {
        let matching = filter_records(
            self.store.get(),
            &self.filter,
            self.current_doctor.as_deref(),
        );
        total_pages(matching.len(), self.page_size)
    }

    pub fn set_tab(&mut self, tab: QueueTab) {
        self.filter.tab = tab;
        self.pager.reset();
    }

    /// Setting an override resets the page; clearing it does not
    pub fn set_doctor_override(&mut self, doctor: Option<String>) {
        match doctor.filter(|d| !d.is_empty()) {
            Some(doctor) => {
                self.filter.doctor = Some(doctor);
                self.pager.reset();
            }
            None => self.filter.doctor = None,
        }
    }

    pub fn next_page(&mut self) -> QueueResult<QueuePage> {
        let total = self.total_pages();
        self.pager.next(total)?;
        Ok(self.page())
    }

    pub fn previous_page(&mut self) -> QueueResult<QueuePage> {
        let total = self.total_pages();
        self.pager.previous(total)?;
        Ok(self.page())
    }

    pub fn go_to_page(&mut self, page: u32) -> QueueResult<QueuePage> {
        let total = self.total_pages();
        self.pager.go_to(page, total)?;
        Ok(self.page())
    }

    pub fn tab_counts(&self) -> TabCounts {
        TabCounts::compute(self.store.get(), self.current_doctor.as_deref())
    }

    /// Summary for the logged-in doctor
    pub fn doctor_overview(&self) -> Option<DoctorOverview> {
        self.current_doctor
            .as_deref()
            .map(|doctor| DoctorOverview::compute(self.store.get(), doctor))
    }

    pub fn has_emergency(&self) -> bool {
        has_emergency(self.store.get())
    }

    // ---- alerts and selection ----

    /// Scan for the first high-risk patient and select it
    ///
    /// A doctor looking at their own queue only scans their own patients.
    pub fn emergency_scan(&mut self, now: DateTime<Utc>) -> EmergencyScan {
        let scope = match (self.filter.tab, self.current_doctor.as_deref()) {
            (QueueTab::Mine, Some(doctor)) => ScanScope::AssignedTo(doctor),
            _ => ScanScope::All,
        };

        let result = self.emitter.emergency_scan(self.store.get(), scope, now);
        match &result {
            EmergencyScan::Critical { patient, .. } => {
                tracing::warn!(patient_id = %patient.id, "Critical patient found");
                self.selected = Some(patient.id.clone());
            }
            EmergencyScan::NoCriticalPatients => {
                tracing::info!("No critical patients at the moment");
            }
        }
        result
    }

    /// Unexpired notifications
    pub fn notifications(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        self.emitter.active(now)
    }

    /// Select a patient for the detail view; `None` if not in the queue
    pub fn select(&mut self, id: &PatientId) -> Option<PatientDetail> {
        let detail = self.detail(id)?;
        self.selected = Some(id.clone());
        Some(detail)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected patient as currently held in the store
    pub fn selected(&self) -> Option<PatientDetail> {
        self.selected.as_ref().and_then(|id| self.detail(id))
    }

    pub fn detail(&self, id: &PatientId) -> Option<PatientDetail> {
        self.store.find(id).map(|record| PatientDetail {
            record: record.clone(),
            history: self.history.get(id),
        })
    }

    pub fn history(&self, id: &PatientId) -> Vec<VitalsSample> {
        self.history.get(id)
    }

    /// Map a textual id (as found in a URL) to a known patient id
    ///
    /// Numeric ids win over text ids with the same spelling.
    pub fn resolve_id(&self, key: &str) -> Option<PatientId> {
        if let Ok(n) = key.parse::<i64>() {
            let numeric = PatientId::Number(n);
            if self.is_known(&numeric) {
                return Some(numeric);
            }
        }

        let text = PatientId::Text(key.to_string());
        if self.is_known(&text) {
            Some(text)
        } else {
            None
        }
    }

    fn is_known(&self, id: &PatientId) -> bool {
        self.store.find(id).is_some() || self.history.patient_ids().any(|known| known == id)
    }
}

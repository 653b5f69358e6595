//! Notification emitter
//!
//! Derives transient notifications from queue changes:
//! - **Arrival**: a patient id not seen before (expires after 5 s by default)
//! - **Critical**: result of an explicit emergency scan (expires after 8 s)
//!
//! The first snapshot only establishes which ids are known; later snapshots
//! and admitted records announce ids that were never seen.

use crate::queue::{PatientId, PatientRecord};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Default lifetime of an arrival notification
pub const DEFAULT_ARRIVAL_TTL_MS: u64 = 5_000;

/// Default lifetime of a critical notification
pub const DEFAULT_CRITICAL_TTL_MS: u64 = 8_000;

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Arrival,
    Critical,
}

/// A transient, self-expiring notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub patient_id: PatientId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Which records an emergency scan looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope<'a> {
    /// The whole queue
    All,
    /// Only records assigned to this doctor
    AssignedTo(&'a str),
}

/// Outcome of an emergency scan
#[derive(Debug, Clone, PartialEq)]
pub enum EmergencyScan {
    /// First high-risk record in queue order, now selected
    Critical {
        patient: PatientRecord,
        notification: Notification,
    },
    /// Nothing high-risk in scope
    NoCriticalPatients,
}

/// Tracks seen patients and the currently active notifications
#[derive(Debug, Clone)]
pub struct NotificationEmitter {
    arrival_ttl: Duration,
    critical_ttl: Duration,
    seen: HashSet<PatientId>,
    baseline: bool,
    active: Vec<Notification>,
}

impl Default for NotificationEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_ARRIVAL_TTL_MS, DEFAULT_CRITICAL_TTL_MS)
    }
}

impl NotificationEmitter {
    pub fn new(arrival_ttl_ms: u64, critical_ttl_ms: u64) -> Self {
        Self {
            arrival_ttl: Duration::milliseconds(arrival_ttl_ms as i64),
            critical_ttl: Duration::milliseconds(critical_ttl_ms as i64),
            seen: HashSet::new(),
            baseline: false,
            active: Vec::new(),
        }
    }

    /// Record the ids of a snapshot as known without announcing them
    pub fn mark_baseline(&mut self, records: &[PatientRecord]) {
        self.seen.extend(records.iter().map(|r| r.id.clone()));
        self.baseline = true;
    }

    /// Announce every unseen id in a pushed snapshot
    ///
    /// The first snapshot observed becomes the baseline and emits nothing.
    pub fn observe_snapshot(
        &mut self,
        records: &[PatientRecord],
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        if !self.baseline {
            self.mark_baseline(records);
            return Vec::new();
        }

        records
            .iter()
            .filter_map(|record| self.observe_arrival(record, now))
            .collect()
    }

    /// Announce a single admitted record if its id is new
    pub fn observe_arrival(
        &mut self,
        record: &PatientRecord,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        if !self.seen.insert(record.id.clone()) {
            return None;
        }

        let message = format!("New Patient Triage: {}", record.display_name());
        Some(self.emit(NotificationKind::Arrival, message, &record.id, now))
    }

    /// Find the first high-risk record in queue order within `scope`
    pub fn emergency_scan(
        &mut self,
        records: &[PatientRecord],
        scope: ScanScope<'_>,
        now: DateTime<Utc>,
    ) -> EmergencyScan {
        let found = records.iter().find(|r| {
            let in_scope = match scope {
                ScanScope::All => true,
                ScanScope::AssignedTo(doctor) => r.is_assigned_to(doctor),
            };
            in_scope && r.is_high_risk()
        });

        match found {
            Some(patient) => {
                let message = format!("CRITICAL: Emergency Alert for {}!", patient.display_name());
                let notification = self.emit(NotificationKind::Critical, message, &patient.id, now);
                EmergencyScan::Critical {
                    patient: patient.clone(),
                    notification,
                }
            }
            None => EmergencyScan::NoCriticalPatients,
        }
    }

    /// Unexpired notifications, oldest first. Expired ones are dropped.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        self.active.retain(|n| !n.is_expired(now));
        self.active.clone()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    fn emit(
        &mut self,
        kind: NotificationKind,
        message: String,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Notification {
        let ttl = match kind {
            NotificationKind::Arrival => self.arrival_ttl,
            NotificationKind::Critical => self.critical_ttl,
        };

        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            message,
            patient_id: patient_id.clone(),
            created_at: now,
            expires_at: now + ttl,
        };

        tracing::debug!(
            kind = ?notification.kind,
            patient_id = %notification.patient_id,
            "Notification emitted"
        );

        self.active.retain(|n| !n.is_expired(now));
        self.active.push(notification.clone());
        notification
    }
}

/// Whether any record in the queue is high risk
pub fn has_emergency(records: &[PatientRecord]) -> bool {
    records.iter().any(PatientRecord::is_high_risk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_first_snapshot_is_silent() {
        let mut emitter = NotificationEmitter::default();
        let records = vec![PatientRecord::new(1), PatientRecord::new(2)];

        assert!(emitter.observe_snapshot(&records, now()).is_empty());
        assert_eq!(emitter.seen_count(), 2);
    }

    #[test]
    fn test_new_ids_emit_arrivals() {
        let mut emitter = NotificationEmitter::default();
        emitter.observe_snapshot(&[PatientRecord::new(1)], now());

        let next = vec![
            PatientRecord::new(1),
            PatientRecord::new(2).name("Ana Lima"),
            PatientRecord::new(3),
        ];
        let emitted = emitter.observe_snapshot(&next, now());

        let messages: Vec<&str> = emitted.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["New Patient Triage: Ana Lima", "New Patient Triage: Anonymous"]
        );
        assert!(emitted.iter().all(|n| n.kind == NotificationKind::Arrival));

        // Already seen on the next push
        assert!(emitter.observe_snapshot(&next, now()).is_empty());
    }

    #[test]
    fn test_admitted_record_announced_once() {
        let mut emitter = NotificationEmitter::default();
        let record = PatientRecord::new("1700000000000").name("Lee");

        let first = emitter.observe_arrival(&record, now()).unwrap();
        assert_eq!(first.message, "New Patient Triage: Lee");
        assert_eq!(first.expires_at - first.created_at, Duration::seconds(5));
        assert!(emitter.observe_arrival(&record, now()).is_none());
    }

    #[test]
    fn test_arrival_expires_after_ttl() {
        let mut emitter = NotificationEmitter::default();
        emitter.observe_arrival(&PatientRecord::new(1), now());

        assert_eq!(emitter.active(now() + Duration::milliseconds(4_999)).len(), 1);
        assert!(emitter.active(now() + Duration::seconds(5)).is_empty());
    }

    #[test]
    fn test_emergency_scan_all_scope() {
        let mut emitter = NotificationEmitter::default();
        let records = vec![
            PatientRecord::new(1).risk_level("Medium").assigned_to("Dr. A"),
            PatientRecord::new(2).name("Ravi").risk_level("High").assigned_to("Dr. B"),
        ];

        match emitter.emergency_scan(&records, ScanScope::All, now()) {
            EmergencyScan::Critical {
                patient,
                notification,
            } => {
                assert_eq!(patient.id, PatientId::from(2));
                assert_eq!(notification.message, "CRITICAL: Emergency Alert for Ravi!");
                assert_eq!(notification.kind, NotificationKind::Critical);
                assert_eq!(
                    notification.expires_at - notification.created_at,
                    Duration::seconds(8)
                );
            }
            EmergencyScan::NoCriticalPatients => panic!("expected a critical patient"),
        }
    }

    #[test]
    fn test_emergency_scan_scoped_to_doctor() {
        let mut emitter = NotificationEmitter::default();
        let records = vec![
            PatientRecord::new(1).risk_level("Medium").assigned_to("Dr. A"),
            PatientRecord::new(2).risk_level("High").assigned_to("Dr. B"),
        ];

        assert_eq!(
            emitter.emergency_scan(&records, ScanScope::AssignedTo("Dr. A"), now()),
            EmergencyScan::NoCriticalPatients
        );
        assert!(emitter.active(now()).is_empty());
    }

    #[test]
    fn test_emergency_scan_skips_other_doctors_high_risk() {
        let mut emitter = NotificationEmitter::default();
        let records = vec![
            PatientRecord::new(1).risk_level("High").assigned_to("Dr. B"),
            PatientRecord::new(2).risk_level("Medium").assigned_to("Dr. A"),
            PatientRecord::new(3).predicted_risk("High").assigned_to("Dr. A"),
        ];

        match emitter.emergency_scan(&records, ScanScope::AssignedTo("Dr. A"), now()) {
            EmergencyScan::Critical { patient, .. } => assert_eq!(patient.id, PatientId::from(3)),
            EmergencyScan::NoCriticalPatients => panic!("expected a critical patient"),
        }
    }

    #[test]
    fn test_expired_notifications_dropped_on_emit() {
        let mut emitter = NotificationEmitter::default();
        emitter.observe_snapshot(&[], now());

        for i in 0..50i64 {
            emitter.observe_arrival(&PatientRecord::new(i), now() + Duration::seconds(i * 10));
        }

        // Nobody polled `active`, yet only the newest arrival is still held
        assert_eq!(emitter.active.len(), 1);
        assert_eq!(emitter.active[0].patient_id, PatientId::from(49));
    }

    #[test]
    fn test_emergency_scan_takes_first_in_queue_order() {
        let mut emitter = NotificationEmitter::default();
        let records = vec![
            PatientRecord::new(1).risk_level("Low"),
            PatientRecord::new(2).risk_level("High"),
            PatientRecord::new(3).predicted_risk("High"),
        ];

        match emitter.emergency_scan(&records, ScanScope::All, now()) {
            EmergencyScan::Critical { patient, .. } => assert_eq!(patient.id, PatientId::from(2)),
            EmergencyScan::NoCriticalPatients => panic!("expected a critical patient"),
        }
    }

    #[test]
    fn test_critical_outlives_arrival() {
        let mut emitter = NotificationEmitter::default();
        let records = vec![PatientRecord::new(9).risk_level("High")];

        emitter.observe_arrival(&PatientRecord::new(1), now());
        emitter.emergency_scan(&records, ScanScope::All, now());

        let later = emitter.active(now() + Duration::seconds(6));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].kind, NotificationKind::Critical);
    }

    #[test]
    fn test_has_emergency() {
        assert!(!has_emergency(&[PatientRecord::new(1).risk_level("Low")]));
        assert!(has_emergency(&[
            PatientRecord::new(1).risk_level("Low").predicted_risk("high")
        ]));
        assert!(!has_emergency(&[]));
    }
}

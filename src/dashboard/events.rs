//! Dashboard events and updates
//!
//! `FeedEvent`s flow into the dashboard from the push channel and the
//! arrival simulator. `DashboardUpdate`s flow out to relay subscribers.

use crate::notify::Notification;
use crate::queue::{PatientId, PatientRecord, VitalsSample};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Input to the apply loop, consumed strictly in receipt order
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A full-queue snapshot from the push channel
    Snapshot {
        records: Vec<PatientRecord>,
        received_at: DateTime<Utc>,
    },
    /// A single record to admit at the head of the queue
    Arrival {
        record: PatientRecord,
        received_at: DateTime<Utc>,
    },
}

impl FeedEvent {
    pub fn snapshot(records: Vec<PatientRecord>) -> Self {
        FeedEvent::Snapshot {
            records,
            received_at: Utc::now(),
        }
    }

    pub fn arrival(record: PatientRecord) -> Self {
        FeedEvent::Arrival {
            record,
            received_at: Utc::now(),
        }
    }
}

/// Change published after state was applied
///
/// One applied event publishes at most one update of each kind, however many
/// records it carries.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardUpdate {
    /// Queue store was replaced
    QueueReplaced { version: u64, count: usize },
    /// Notifications emitted by one event
    Notifications { notifications: Vec<Notification> },
    /// Vitals samples taken from one snapshot
    VitalsRecorded {
        received_at: DateTime<Utc>,
        samples: Vec<PatientSample>,
    },
}

/// A vitals sample tagged with its patient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSample {
    pub patient_id: PatientId,
    pub sample: VitalsSample,
}

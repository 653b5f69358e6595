//! Relay Message Types
//!
//! Messages exchanged between dashboard clients and the relay.

use crate::dashboard::DashboardUpdate;
use crate::notify::Notification;
use crate::queue::{PatientId, VitalsSample};
use serde::{Deserialize, Serialize};

/// Topic carrying queue replacement events
pub const QUEUE_TOPIC: &str = "queue";

/// Topic carrying notifications
pub const NOTIFICATIONS_TOPIC: &str = "notifications";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics (e.g., "queue", "vitals.*", "vitals.10001")
    Subscribe { topics: Vec<String> },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The queue was replaced; clients re-fetch the page they show
    QueueUpdated { version: u64, count: usize },
    /// A notification was emitted
    Notification { notification: Notification },
    /// A new vitals sample for one patient
    Vitals {
        patient_id: PatientId,
        sample: VitalsSample,
        /// Chart label for the sample time
        label: String,
    },
    Subscribed { topics: Vec<String> },
    Unsubscribed { topics: Vec<String> },
    Pong,
    Error { message: String },
    Connected { connection_id: String },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "vitals.10001")
    pub topic: String,
    pub message: ServerMessage,
}

impl WsEvent {
    pub fn queue_updated(version: u64, count: usize) -> Self {
        Self {
            topic: QUEUE_TOPIC.to_string(),
            message: ServerMessage::QueueUpdated { version, count },
        }
    }

    pub fn notification(notification: Notification) -> Self {
        Self {
            topic: NOTIFICATIONS_TOPIC.to_string(),
            message: ServerMessage::Notification { notification },
        }
    }

    pub fn vitals(patient_id: PatientId, sample: VitalsSample) -> Self {
        let label = sample.time_label();
        Self {
            topic: format!("vitals.{}", patient_id),
            message: ServerMessage::Vitals {
                patient_id,
                sample,
                label,
            },
        }
    }
}

impl WsEvent {
    /// Expand a dashboard update into the events relay clients subscribe to.
    /// Batched notifications and vitals fan out to one event each.
    pub fn from_update(update: DashboardUpdate) -> Vec<WsEvent> {
        match update {
            DashboardUpdate::QueueReplaced { version, count } => {
                vec![WsEvent::queue_updated(version, count)]
            }
            DashboardUpdate::Notifications { notifications } => notifications
                .into_iter()
                .map(WsEvent::notification)
                .collect(),
            DashboardUpdate::VitalsRecorded { samples, .. } => samples
                .into_iter()
                .map(|s| WsEvent::vitals(s.patient_id, s.sample))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::PatientSample;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","topics":["queue","vitals.*"]}"#).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => assert_eq!(topics, vec!["queue", "vitals.*"]),
            other => panic!("unexpected: {:?}", other),
        }

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));
    }

    #[test]
    fn test_vitals_event_topic_and_label() {
        let sample = VitalsSample {
            time: Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap(),
            heart_rate: Some(88.0),
            temperature: Some(37.2),
            o2_saturation: Some(97.0),
            bp_systolic: Some(120.0),
        };
        let events = WsEvent::from_update(DashboardUpdate::VitalsRecorded {
            received_at: sample.time,
            samples: vec![
                PatientSample {
                    patient_id: PatientId::from(10001),
                    sample: sample.clone(),
                },
                PatientSample {
                    patient_id: PatientId::from("walk-in"),
                    sample,
                },
            ],
        });

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].topic, "vitals.10001");
        assert_eq!(events[1].topic, "vitals.walk-in");
        let json = serde_json::to_value(&events[0].message).unwrap();
        assert_eq!(json["type"], "vitals");
        assert_eq!(json["patient_id"], 10001);
        assert_eq!(json["label"], "14:05:09");
    }

    #[test]
    fn test_queue_event_serialization() {
        let events = WsEvent::from_update(DashboardUpdate::QueueReplaced { version: 3, count: 12 });
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.topic, QUEUE_TOPIC);

        let json = serde_json::to_string(&event.message).unwrap();
        assert!(json.contains(r#""type":"queue_updated""#));
        assert!(json.contains(r#""count":12"#));
    }
}

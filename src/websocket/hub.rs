//! Relay Connection Hub
//!
//! Tracks relay connections and their topic subscriptions, and fans dashboard
//! updates out to the subscribers of each topic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, NOTIFICATIONS_TOPIC, QUEUE_TOPIC};
use crate::dashboard::DashboardUpdate;
use crate::tasks::TaskGuard;

/// Unique identifier for a relay connection
pub type ConnectionId = String;

/// Manages relay connections and subscriptions
pub struct ConnectionHub {
    /// ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Topic → subscribed ConnectionIds
    subscriptions: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    config: HubConfig,
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 256,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    pub subscriptions: HashSet<String>,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a new connection
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "Relay client connected");
        Ok(id)
    }

    /// Unregister a connection and drop its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "Relay client disconnected");
    }

    /// Subscribe a connection to topics. Unknown topics are skipped.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone())
                .or_default()
                .insert(id.to_string());
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic.
    ///
    /// "vitals.*" subscribers receive every "vitals.{id}" event.
    /// Returns the number of connections reached.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let subs = self.subscriptions.read().await;
        let connections = self.connections.read().await;

        let mut targets: HashSet<&ConnectionId> = HashSet::new();
        if let Some(ids) = subs.get(&event.topic) {
            targets.extend(ids);
        }
        if let Some((prefix, _)) = event.topic.split_once('.') {
            if let Some(ids) = subs.get(&format!("{}.*", prefix)) {
                targets.extend(ids);
            }
        }

        let mut sent = 0;
        for id in targets {
            if let Some(handle) = connections.get(id) {
                if handle.sender.send(event.message.clone()).is_ok() {
                    sent += 1;
                }
            }
        }

        if sent > 0 {
            tracing::trace!(topic = %event.topic, subscribers = sent, "Broadcast event");
        }
        sent
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

/// Relay dashboard updates into the hub until the update channel closes
pub fn spawn_forwarder(
    hub: Arc<ConnectionHub>,
    mut updates: broadcast::Receiver<DashboardUpdate>,
) -> TaskGuard {
    TaskGuard::spawn("relay", async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    for event in WsEvent::from_update(update) {
                        hub.broadcast(&event).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Relay lagged behind dashboard updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Valid topics: "queue", "notifications", "vitals.*" and "vitals.{id}"
fn is_valid_topic(topic: &str) -> bool {
    topic == QUEUE_TOPIC
        || topic == NOTIFICATIONS_TOPIC
        || topic
            .strip_prefix("vitals.")
            .map(|rest| !rest.is_empty())
            .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;
    use crate::config::Config;
    use crate::dashboard::{DashboardService, FeedEvent};
    use crate::queue::{PatientId, PatientRecord, VitalsSample};
    use chrono::Utc;
    use std::time::Duration;

    fn sample() -> VitalsSample {
        VitalsSample {
            time: Utc::now(),
            heart_rate: Some(90.0),
            temperature: None,
            o2_saturation: None,
            bp_systolic: None,
        }
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("queue"));
        assert!(is_valid_topic("notifications"));
        assert!(is_valid_topic("vitals.*"));
        assert!(is_valid_topic("vitals.10001"));

        assert!(!is_valid_topic("vitals."));
        assert!(!is_valid_topic(""));
        assert!(!is_valid_topic("metrics.mood"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert_eq!(hub.connection_count().await, 1);

        hub.subscribe(&id, vec!["queue".into()]).await.unwrap();
        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.subscription_count("queue").await, 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 1 });
        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();

        hub.register(tx1).await.unwrap();
        let result = hub.register(tx2).await;
        assert!(matches!(result, Err(HubError::TooManyConnections(1))));
    }

    #[tokio::test]
    async fn test_subscribe_skips_invalid_topics() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["queue".into(), "bogus".into()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["queue"]);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["queue".into(), "notifications".into()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["queue"]);
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let hub = ConnectionHub::new(HubConfig::default());
        let result = hub.subscribe("missing", vec!["queue".into()]).await;
        assert!(matches!(result, Err(HubError::ConnectionNotFound)));
    }

    #[tokio::test]
    async fn test_broadcast_by_topic() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        hub.subscribe(&id1, vec!["vitals.10001".into()]).await.unwrap();
        hub.subscribe(&id2, vec!["queue".into()]).await.unwrap();

        let sent = hub
            .broadcast(&WsEvent::vitals(PatientId::from(10001), sample()))
            .await;
        assert_eq!(sent, 1);
        assert!(matches!(rx1.try_recv(), Ok(ServerMessage::Vitals { .. })));
        assert!(rx2.try_recv().is_err());

        // Other patients are not delivered to a specific subscription
        hub.broadcast(&WsEvent::vitals(PatientId::from(10002), sample()))
            .await;
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_subscription() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(&id, vec!["vitals.*".into(), "vitals.7".into()])
            .await
            .unwrap();

        // One delivery even when both the wildcard and the exact topic match
        let sent = hub.broadcast(&WsEvent::vitals(PatientId::from(7), sample())).await;
        assert_eq!(sent, 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forwarder_relays_updates() {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["queue".into()]).await.unwrap();

        let (updates, updates_rx) = broadcast::channel(16);
        let guard = spawn_forwarder(Arc::clone(&hub), updates_rx);

        updates
            .send(DashboardUpdate::QueueReplaced { version: 2, count: 5 })
            .unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            msg,
            ServerMessage::QueueUpdated { version: 2, count: 5 }
        ));

        drop(updates);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(guard.is_finished());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_large_snapshots_keep_queue_and_arrival_updates() {
        let mut config = Config::default();
        config.push.enabled = false;
        let service = DashboardService::new(config, Arc::new(FakeBackend::default()));

        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["queue".into(), "notifications".into(), "vitals.7".into()])
            .await
            .unwrap();
        let _relay = spawn_forwarder(Arc::clone(&hub), service.subscribe_updates());

        let baseline: Vec<PatientRecord> = (0..2000i64).map(PatientRecord::new).collect();
        let mut next = baseline.clone();
        next.push(PatientRecord::new(99999).name("Late Arrival"));

        assert!(service.submit(FeedEvent::snapshot(baseline)).await);
        assert!(service.submit(FeedEvent::snapshot(next)).await);

        let (mut queue_updates, mut arrivals, mut vitals) = (0, Vec::new(), 0);
        while queue_updates < 2 || arrivals.is_empty() || vitals < 2 {
            let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("relay went quiet")
                .unwrap();
            match msg {
                ServerMessage::QueueUpdated { .. } => queue_updates += 1,
                ServerMessage::Notification { notification } => arrivals.push(notification),
                ServerMessage::Vitals { patient_id, .. } => {
                    assert_eq!(patient_id, PatientId::from(7));
                    vitals += 1;
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }

        assert_eq!(queue_updates, 2);
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].message, "New Patient Triage: Late Arrival");
        service.shutdown().await;
    }
}

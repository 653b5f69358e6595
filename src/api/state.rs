//! Application State
//!
//! Shared state accessible by all API handlers.

use crate::dashboard::DashboardService;
use crate::tasks::TaskGuard;
use crate::websocket::{spawn_forwarder, ConnectionHub, HubConfig};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
pub struct AppState {
    /// Live dashboard and its backend
    pub service: Arc<DashboardService>,
    /// Relay connection hub
    pub hub: Arc<ConnectionHub>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Task relaying dashboard updates into the hub
    _relay: TaskGuard,
}

impl AppState {
    /// Create the state and start relaying dashboard updates. Must run inside a Tokio runtime.
    pub fn new(service: Arc<DashboardService>) -> Self {
        Self::with_hub_config(service, HubConfig::default())
    }

    pub fn with_hub_config(service: Arc<DashboardService>, hub_config: HubConfig) -> Self {
        let hub = Arc::new(ConnectionHub::new(hub_config));
        let relay = spawn_forwarder(Arc::clone(&hub), service.subscribe_updates());

        Self {
            service,
            hub,
            start_time: Instant::now(),
            _relay: relay,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}

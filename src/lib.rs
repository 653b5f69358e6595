//! # Triage Live
//!
//! Live patient-triage queue synchronizer. Keeps a local mirror of a remote
//! triage backend's patient queue and derives everything a dashboard draws
//! from it.
//!
//! ## Features
//!
//! - **Full-replace queue store**: every push snapshot replaces the queue
//! - **Vitals history**: bounded per-patient trend (last 20 samples)
//! - **Queue views**: doctor filter, stable severity sort, 9-per-page pager
//! - **Notifications**: arrival and critical alerts with their own lifetimes
//! - **Triage intake**: validated prediction requests, document merge, chat
//! - **Local API**: REST endpoints and a WebSocket relay for view clients
//!
//! ## Modules
//!
//! - [`queue`]: Queue store, snapshots, vitals history and the view pipeline
//! - [`notify`]: Arrival and critical notifications
//! - [`backend`]: Triage backend client, intake, chat and bias statistics
//! - [`push`]: Push channel subscription
//! - [`dashboard`]: Live dashboard state, apply loop and owned tasks
//! - [`api`]: Local view API with Axum
//! - [`websocket`]: Update relay for view clients
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use triage_live::{Config, DashboardService, TriageClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default();
//!     let backend = Arc::new(TriageClient::new(&config.backend)?);
//!
//!     let service = DashboardService::new(config, backend);
//!     service.initial_load().await?;
//!     service.start_push().await;
//!
//!     let page = service.read().await.page();
//!     println!("{} of {} patients shown", page.records.len(), page.total_matching);
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod notify;
pub mod push;
pub mod queue;
pub mod tasks;
pub mod websocket;

// Re-export top-level types for convenience
pub use queue::{
    PatientId, PatientRecord, QueueError, QueueFilter, QueuePage, QueueResult, QueueStore,
    QueueTab, RiskLevel, VitalsHistory, VitalsSample,
};

pub use notify::{EmergencyScan, Notification, NotificationEmitter, NotificationKind};

pub use backend::{
    BackendError, ChatSession, IntakeError, IntakeForm, TriageBackend, TriageClient,
};

pub use dashboard::{DashboardService, DashboardUpdate, FeedEvent, LiveDashboard, TriageError};

pub use push::PushError;

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent};

pub use config::{Config, ConfigError};

pub use tasks::TaskGuard;

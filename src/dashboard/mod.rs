//! Live Dashboard
//!
//! ## Architecture
//!
//! - **LiveDashboard**: Queue store, vitals history, notifications and view state
//! - **DashboardService**: Apply loop, owned background tasks, backend-backed actions
//! - **Simulator**: Periodic simulated arrivals
//!
//! ## Data Flow
//!
//! 1. Push channel and simulator send `FeedEvent`s into one channel
//! 2. The apply loop applies them to the dashboard in receipt order
//! 3. Each applied change is broadcast as a `DashboardUpdate`
//! 4. User actions take the same lock and publish the same way

mod events;
mod live;
mod service;
mod simulator;

pub use events::{DashboardUpdate, FeedEvent, PatientSample};
pub use live::{LiveDashboard, PatientDetail};
pub use service::{DashboardService, TriageError};

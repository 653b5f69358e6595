//! Live Queue
//!
//! This module holds the patient queue state and the views derived from it:
//!
//! - **types**: Core data structures (PatientRecord, PatientId, RiskLevel, VitalsSample)
//! - **snapshot**: Decoding and validating full-queue snapshots
//! - **store**: The queue store, replaced wholesale on every push
//! - **history**: Bounded per-patient vitals history
//! - **view**: Filter / sort / paginate pipeline and the pager
//! - **error**: Error types
//!
//! # Data Flow
//!
//! ```text
//! Push frame → parse_snapshot → QueueStore::replace
//!                             → VitalsHistory::record
//!
//! View:  QueueStore::get → filter → stable severity sort → page slice
//! ```

pub mod error;
pub mod history;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use error::{QueueError, QueueResult};
pub use history::{VitalsHistory, DEFAULT_HISTORY_CAPACITY};
pub use snapshot::{parse_snapshot, snapshot_from_value};
pub use store::QueueStore;
pub use types::{PatientId, PatientRecord, RiskLevel, Severity, VitalsSample};
pub use view::{
    compute_page, filter_records, sort_by_severity, total_pages, DoctorOverview, Pager,
    QueueFilter, QueuePage, QueueTab, TabCounts, DEFAULT_PAGE_SIZE,
};

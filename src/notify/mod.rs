//! Notifications
//!
//! Arrival and critical alerts derived from queue deltas and emergency scans.

pub mod emitter;

pub use emitter::{
    has_emergency, EmergencyScan, Notification, NotificationEmitter, NotificationKind, ScanScope,
    DEFAULT_ARRIVAL_TTL_MS, DEFAULT_CRITICAL_TTL_MS,
};

//! Push Channel
//!
//! Subscription to the backend's full-queue snapshot stream.

mod channel;

pub use channel::{reconnect_delay, run_connection, subscribe, ConnectionSummary, PushError};

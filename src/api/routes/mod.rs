//! API Routes
//!
//! Route handlers organized by functionality.

pub mod alerts;
pub mod directory;
pub mod health;
pub mod patients;
pub mod queue;
pub mod triage;

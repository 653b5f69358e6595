//! Snapshot decoding
//!
//! A push frame or `GET /patients` body must be a JSON array whose every
//! element is a valid `PatientRecord`. Anything else is rejected as a whole so
//! the caller can keep its prior state.

use super::error::{QueueError, QueueResult};
use super::types::PatientRecord;
use serde_json::Value;

/// Parse a raw snapshot payload
pub fn parse_snapshot(payload: &str) -> QueueResult<Vec<PatientRecord>> {
    let value: Value = serde_json::from_str(payload)?;
    snapshot_from_value(value)
}

/// Convert an already-decoded JSON value into a snapshot
pub fn snapshot_from_value(value: Value) -> QueueResult<Vec<PatientRecord>> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(QueueError::NotAList(json_kind(&other))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| QueueError::InvalidRecord {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

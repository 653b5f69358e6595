//! Vitals history cache
//!
//! Bounded per-patient FIFO of vitals samples. Each push appends one sample
//! per record present; buffers of patients missing from a push are kept as-is.

use super::types::{PatientId, PatientRecord, VitalsSample};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Samples kept per patient unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Per-patient ring buffers of vitals samples
#[derive(Debug, Clone)]
pub struct VitalsHistory {
    capacity: usize,
    buffers: HashMap<PatientId, VecDeque<VitalsSample>>,
}

impl Default for VitalsHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl VitalsHistory {
    /// Create a cache holding at most `capacity` samples per patient (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: HashMap::new(),
        }
    }

    /// Append one sample per record, evicting the oldest beyond capacity
    pub fn record(&mut self, records: &[PatientRecord], now: DateTime<Utc>) {
        let capacity = self.capacity;
        for record in records {
            let buffer = self
                .buffers
                .entry(record.id.clone())
                .or_insert_with(|| VecDeque::with_capacity(capacity));

            buffer.push_back(VitalsSample::from_record(record, now));
            while buffer.len() > capacity {
                buffer.pop_front();
            }
        }
    }

    /// Samples for a patient, oldest first. Unknown ids yield an empty list.
    pub fn get(&self, id: &PatientId) -> Vec<VitalsSample> {
        self.buffers
            .get(id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids that have at least one sample
    pub fn patient_ids(&self) -> impl Iterator<Item = &PatientId> {
        self.buffers.keys()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn patient_count(&self) -> usize {
        self.buffers.len()
    }
}

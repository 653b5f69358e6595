//! Queue store
//!
//! Holds the most recent full queue snapshot. There is no partial update:
//! every change, including admitting a single record, is a full replace.

use super::types::{PatientId, PatientRecord};
use chrono::{DateTime, Utc};

/// Current list of patient records in backend order
#[derive(Debug, Default, Clone)]
pub struct QueueStore {
    records: Vec<PatientRecord>,
    version: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held list unconditionally
    pub fn replace(&mut self, records: Vec<PatientRecord>) {
        self.records = records;
        self.version += 1;
        self.updated_at = Some(Utc::now());
    }

    pub fn get(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Put a new record at the head of the queue
    pub fn admit(&mut self, record: PatientRecord) {
        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.push(record);
        next.extend(self.records.iter().cloned());
        self.replace(next);
    }

    pub fn find(&self, id: &PatientId) -> Option<&PatientRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Number of replaces applied so far
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(store: &QueueStore) -> Vec<PatientId> {
        store.get().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_store_equals_latest_push() {
        let mut store = QueueStore::new();
        let pushes = vec![
            vec![PatientRecord::new(1), PatientRecord::new(2)],
            vec![PatientRecord::new(3)],
            vec![],
            vec![PatientRecord::new(2).name("Changed"), PatientRecord::new(4)],
        ];

        for push in &pushes {
            store.replace(push.clone());
            assert_eq!(store.get(), push.as_slice());
        }
        assert_eq!(store.version(), 4);
        assert!(store.updated_at().is_some());
    }

    #[test]
    fn test_admit_prepends() {
        let mut store = QueueStore::new();
        store.replace(vec![PatientRecord::new(1), PatientRecord::new(2)]);
        store.admit(PatientRecord::new("1700000000000"));

        assert_eq!(
            ids(&store),
            vec![
                PatientId::from("1700000000000"),
                PatientId::from(1),
                PatientId::from(2)
            ]
        );
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_find_distinguishes_id_types() {
        let mut store = QueueStore::new();
        store.replace(vec![PatientRecord::new(123).name("Number")]);

        assert!(store.find(&PatientId::from(123)).is_some());
        assert!(store.find(&PatientId::from("123")).is_none());
    }
}

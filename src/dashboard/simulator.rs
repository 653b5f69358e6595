//! Simulated arrivals
//!
//! Periodically asks the backend for a synthetic patient and feeds it to the
//! apply loop as an arrival. Failures are logged and the next tick tries again.

use super::events::FeedEvent;
use crate::backend::TriageBackend;
use crate::tasks::TaskGuard;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Start the arrival timer
pub fn spawn(
    backend: Arc<dyn TriageBackend>,
    interval_ms: u64,
    events: mpsc::Sender<FeedEvent>,
) -> TaskGuard {
    TaskGuard::spawn("simulator", run(backend, interval_ms.max(1), events))
}

async fn run(backend: Arc<dyn TriageBackend>, interval_ms: u64, events: mpsc::Sender<FeedEvent>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    // The first tick completes immediately; arrivals start one interval in
    ticker.tick().await;

    tracing::info!(interval_ms, "Arrival simulation started");

    loop {
        ticker.tick().await;

        match backend.simulate_arrival().await {
            Ok(Some(record)) => {
                tracing::debug!(patient_id = %record.id, "Simulated arrival");
                if events.send(FeedEvent::arrival(record)).await.is_err() {
                    tracing::debug!("Dashboard gone, stopping simulation");
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!("Backend has no patient profiles to simulate");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Simulated arrival failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;
    use crate::queue::{PatientId, PatientRecord};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_arrivals_are_forwarded() {
        let backend = Arc::new(FakeBackend::default());
        backend.queue_arrival(PatientRecord::new(10001).name("Jordan Smith"));
        backend.queue_arrival(PatientRecord::new(10002));

        let (tx, mut rx) = mpsc::channel(8);
        let guard = spawn(backend.clone(), 10, tx);

        let mut received = Vec::new();
        while received.len() < 2 {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
                Ok(Some(FeedEvent::Arrival { record, .. })) => received.push(record.id),
                other => panic!("unexpected: {:?}", other),
            }
        }
        guard.stop().await;

        assert_eq!(received, vec![PatientId::from(10001), PatientId::from(10002)]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_timer() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_offline(true);

        let (tx, _rx) = mpsc::channel(8);
        let guard = spawn(backend.clone(), 10, tx);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!guard.is_finished());
        guard.stop().await;
    }

    #[tokio::test]
    async fn test_stop_halts_requests() {
        let backend = Arc::new(FakeBackend::default());
        let (tx, _rx) = mpsc::channel(8);
        let guard = spawn(backend.clone(), 10, tx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        guard.stop().await;

        let calls = backend.arrival_calls.load(Ordering::SeqCst);
        assert!(calls > 0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.arrival_calls.load(Ordering::SeqCst), calls);
    }
}

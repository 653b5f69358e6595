//! Push channel subscription
//!
//! Connects to the backend's vitals WebSocket and forwards every valid
//! full-queue snapshot into the dashboard's event channel. Malformed frames
//! are logged and dropped; the previous state stays in place.

use crate::config::PushConfig;
use crate::dashboard::FeedEvent;
use crate::queue::parse_snapshot;
use crate::tasks::TaskGuard;
use futures_util::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Errors that end a push connection
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("Push stream error: {0}")]
    Stream(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Event receiver closed")]
    ReceiverClosed,
}

/// How one connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub snapshots: usize,
    pub discarded: usize,
}

/// Delay before reconnect attempt `attempt` (0-based): 1s, 2s, 4s ... capped at 30s
pub fn reconnect_delay(attempt: u32) -> Duration {
    let millis = 2u64.saturating_pow(attempt.min(16)).saturating_mul(1000);
    Duration::from_millis(millis.min(30_000))
}

/// Subscribe to the push channel in a background task
pub fn subscribe(config: PushConfig, events: mpsc::Sender<FeedEvent>) -> TaskGuard {
    TaskGuard::spawn("push", run(config, events))
}

async fn run(config: PushConfig, events: mpsc::Sender<FeedEvent>) {
    let mut attempts = 0u32;

    loop {
        match run_connection(&config.url, &events).await {
            Ok(summary) => {
                tracing::info!(
                    url = %config.url,
                    snapshots = summary.snapshots,
                    discarded = summary.discarded,
                    "Push channel closed"
                );
                if summary.snapshots > 0 {
                    attempts = 0;
                }
            }
            Err(PushError::ReceiverClosed) => {
                tracing::debug!("Dashboard gone, ending push subscription");
                return;
            }
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "Push channel failed");
            }
        }

        if attempts >= config.max_reconnect_attempts {
            tracing::info!(url = %config.url, "Push channel not reconnecting");
            return;
        }

        let delay = reconnect_delay(attempts);
        attempts += 1;
        tracing::info!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting push channel"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Read one connection until the server closes it
pub async fn run_connection(
    url: &str,
    events: &mpsc::Sender<FeedEvent>,
) -> Result<ConnectionSummary, PushError> {
    let (mut stream, _) = connect_async(url).await.map_err(|source| PushError::Connect {
        url: url.to_string(),
        source,
    })?;
    tracing::info!(url = %url, "Push channel connected");

    let mut summary = ConnectionSummary {
        snapshots: 0,
        discarded: 0,
    };

    while let Some(frame) = stream.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match parse_snapshot(&text) {
            Ok(records) => {
                tracing::debug!(count = records.len(), "Snapshot received");
                events
                    .send(FeedEvent::snapshot(records))
                    .await
                    .map_err(|_| PushError::ReceiverClosed)?;
                summary.snapshots += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed push frame");
                summary.discarded += 1;
            }
        }
    }

    Ok(summary)
}

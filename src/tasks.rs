//! Owned background tasks
//!
//! Every long-running task (push subscription, arrival simulation, relay
//! forwarder) is held through a `TaskGuard`. Dropping or stopping the guard
//! aborts the task, so a task never outlives whoever started it.

use tokio::task::JoinHandle;

/// Handle that tears down its task when stopped or dropped
#[derive(Debug)]
pub struct TaskGuard {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl TaskGuard {
    pub fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self {
            name,
            handle: Some(handle),
        }
    }

    /// Spawn `future` on the runtime and guard it
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self::new(name, tokio::spawn(future))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Abort the task and wait until it is gone
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            tracing::debug!(task = self.name, "Task stopped");
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

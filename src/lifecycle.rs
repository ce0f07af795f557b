//! Start/stop coordination for long-lived background tasks.
//!
//! A [`Lifecycle`] owns one [`CancellationToken`] shared by every task it
//! starts. [`Lifecycle::stop`] only broadcasts the cancellation; each task
//! observes it at its next wake point. [`Lifecycle::join`] waits for them.

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background tasks sharing one shutdown signal.
#[derive(Debug, Default)]
pub struct Lifecycle {
    token: CancellationToken,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token observed by tasks started through this lifecycle.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a named task on the current tokio runtime.
    ///
    /// The future receives nothing: it should capture [`Lifecycle::token`]
    /// and return once the token is cancelled.
    pub fn start<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        tracing::debug!(task = name, "Background task started");
        match self.tasks.lock() {
            Ok(mut tasks) => tasks.push((name, handle)),
            Err(poisoned) => poisoned.into_inner().push((name, handle)),
        }
    }

    /// Broadcast the shutdown signal. Does not wait.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for every started task to finish.
    ///
    /// Tasks started after this call begins are not awaited.
    pub async fn join(&self) {
        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        for (name, handle) in tasks {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = %e, "Background task failed");
            } else {
                tracing::debug!(task = name, "Background task finished");
            }
        }
    }
}

//! Recurring background tasks.
//!
//! [`RecurringTask`] runs an async job on a fixed period, optionally woken
//! early through a [`Notify`]. The document flush loop and the expiry sweeper
//! are both built on it.
//!
//! A job is never cancelled midway: stopping the task only takes effect
//! between runs, and [`RecurringTask::stop`] waits for the current run to
//! finish.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a spawned recurring job.
pub struct RecurringTask {
    name: &'static str,
    stop_tx: Mutex<Option<mpsc::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RecurringTask {
    /// Spawn `job` on the current tokio runtime.
    ///
    /// The first run happens immediately, then every `period`. When `wake` is
    /// given, a notification runs the job right away and restarts the period.
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        wake: Option<Arc<Notify>>,
        mut job: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(
                task = name,
                period_ms = period.as_millis() as u64,
                "Recurring task started"
            );

            loop {
                let woken = tokio::select! {
                    biased;

                    _ = stop_rx.recv() => break,
                    _ = interval.tick() => false,
                    _ = notified(wake.as_deref()) => true,
                };

                job().await;

                if woken {
                    interval.reset();
                }
            }

            tracing::debug!(task = name, "Recurring task stopped");
        });

        Self {
            name,
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the task to stop after its current run. Idempotent.
    pub fn cancel(&self) {
        self.stop_tx.lock().take();
    }

    /// Stop the task and wait until it has exited. Idempotent.
    pub async fn stop(&self) {
        self.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(task = self.name, "Recurring task ended abnormally: {}", e);
            }
        }
    }

    /// Whether the task has been cancelled or stopped.
    pub fn is_cancelled(&self) -> bool {
        self.stop_tx.lock().is_none()
    }
}

async fn notified(wake: Option<&Notify>) {
    match wake {
        Some(notify) => notify.notified().await,
        None => std::future::pending().await,
    }
}

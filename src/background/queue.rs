//! Bounded task queue and its worker.

use futures_util::future::BoxFuture;
use std::future::Future;
use tokio::sync::{broadcast, mpsc};

use crate::backend::BackendError;
use crate::observability::metrics;

/// A named unit of fire-and-forget work.
pub struct BackgroundTask {
    name: &'static str,
    future: BoxFuture<'static, Result<(), BackendError>>,
}

impl BackgroundTask {
    pub fn new<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<(), BackendError>> + Send + 'static,
    {
        Self {
            name,
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Sending half, cloned into every handler.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<BackgroundTask>,
}

impl TaskQueue {
    /// Create a queue holding at most `capacity` pending tasks, and the
    /// worker that drains it.
    pub fn new(capacity: usize) -> (Self, TaskWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, TaskWorker { rx })
    }

    /// Enqueue `future` without waiting. Returns false when the task was
    /// dropped because the queue is full or the worker is gone.
    pub fn dispatch<F>(&self, name: &'static str, future: F) -> bool
    where
        F: Future<Output = Result<(), BackendError>> + Send + 'static,
    {
        match self.tx.try_send(BackgroundTask::new(name, future)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                tracing::warn!(task = task.name, "Background queue full, dropping task");
                metrics::record_background_task(task.name, "dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                tracing::warn!(task = task.name, "Background worker stopped, dropping task");
                metrics::record_background_task(task.name, "dropped");
                false
            }
        }
    }
}

/// Receiving half; runs queued tasks one at a time.
pub struct TaskWorker {
    rx: mpsc::Receiver<BackgroundTask>,
}

impl TaskWorker {
    /// Run until every [`TaskQueue`] clone is dropped. Tasks dispatched by
    /// handlers still in flight during graceful shutdown keep running.
    pub async fn run(mut self) {
        tracing::debug!("Background worker started");
        let mut completed = 0usize;
        while let Some(task) = self.rx.recv().await {
            execute(task).await;
            completed += 1;
        }
        tracing::info!(completed, "Background worker drained");
    }

    /// Run until every [`TaskQueue`] is dropped, or until `shutdown` fires,
    /// in which case tasks already queued still run and later dispatches
    /// are refused.
    pub async fn run_until(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::debug!("Background worker started");
        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(task) => execute(task).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.rx.close();
                    let mut drained = 0usize;
                    while let Some(task) = self.rx.recv().await {
                        execute(task).await;
                        drained += 1;
                    }
                    tracing::info!(drained, "Background worker drained");
                    break;
                }
            }
        }
        tracing::debug!("Background worker stopped");
    }
}

async fn execute(task: BackgroundTask) {
    match task.future.await {
        Ok(()) => {
            tracing::debug!(task = task.name, "Background task complete");
            metrics::record_background_task(task.name, "success");
        }
        Err(e) => {
            tracing::warn!(task = task.name, service = e.service(), error = %e, "Background task failed");
            metrics::record_background_task(task.name, "failure");
        }
    }
}

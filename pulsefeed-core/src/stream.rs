use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a spawned push-subscription task.
///
/// Stopping sends a best-effort graceful signal and awaits completion;
/// dropping without stopping signals and then aborts whatever is still
/// running.
#[derive(Debug)]
pub struct StreamHandle {
    task: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl StreamHandle {
    /// Wrap a spawned task and its stop channel.
    #[must_use]
    pub fn new(task: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            task: Some(task),
            stop_tx: Some(stop_tx),
        }
    }

    /// Request graceful shutdown and wait for the task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// True when the underlying task has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && !task.is_finished()
        {
            task.abort();
        }
    }
}

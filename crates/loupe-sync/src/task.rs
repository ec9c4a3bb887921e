//! Producer task lifecycle

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle over one spawned producer task.
///
/// Each producer owns an independent shutdown channel; every await inside
/// the task sits under a `select!` against it, so signalling unwinds the
/// task at its next suspension point without cutting a consumer dispatch
/// mid-flight.
pub(crate) struct TaskHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(shutdown: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { shutdown, task }
    }

    /// Signal the task to stop; it unwinds on its own
    pub fn stop(self) {
        let _ = self.shutdown.send(true);
        drop(self.task);
    }
}

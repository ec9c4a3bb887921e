//! Debounced delta batching
//!
//! Deltas accepted from the notification stream are buffered and flushed to
//! the consumer sink once per debounce window, so a burst of notifications
//! becomes one batch call. The lock covers only the buffer swap; the sink is
//! always awaited outside it, so a slow consumer never blocks a producer.

use crate::delta::{DeltaSink, ObjectDelta};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Cheaply cloneable handle; clones share one pending buffer
#[derive(Clone)]
pub(crate) struct DeltaBatcher {
    inner: Arc<BatcherInner>,
}

struct BatcherInner {
    window: Duration,
    sink: DeltaSink,
    shutdown: watch::Receiver<bool>,
    state: Mutex<BatchState>,
}

#[derive(Default)]
struct BatchState {
    pending: Vec<ObjectDelta>,
    flush_scheduled: bool,
}

impl DeltaBatcher {
    pub fn new(window: Duration, sink: DeltaSink, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                window,
                sink,
                shutdown,
                state: Mutex::new(BatchState::default()),
            }),
        }
    }

    /// Append deltas and make sure one flush is scheduled within the window
    pub fn push(&self, deltas: Vec<ObjectDelta>) {
        {
            let mut state = self.inner.state.lock();
            state.pending.extend(deltas);
            if state.pending.is_empty() || state.flush_scheduled {
                return;
            }
            state.flush_scheduled = true;
        }

        let batcher = self.clone();
        let mut shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(batcher.inner.window) => batcher.flush().await,
                _ = shutdown.changed() => {}
            }
        });
    }

    /// Swap the buffer out and dispatch it; empty buffers are never
    /// dispatched
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.inner.state.lock();
            state.flush_scheduled = false;
            std::mem::take(&mut state.pending)
        };

        if batch.is_empty() {
            return;
        }
        debug!("dispatching batch of {} deltas", batch.len());
        (self.inner.sink)(batch).await;
    }
}

//! Real-time event ingestion
//!
//! One background task per subscription: it holds the notification long
//! poll open, decodes each payload, applies the resulting deltas to the
//! index immediately (queries never lag behind parsing), and feeds the
//! debounce batcher. Per-payload decode failures are logged and skipped; a
//! transport failure or server-side close ends the subscription without
//! automatic resubscription.

use crate::batch::DeltaBatcher;
use crate::delta::DeltaSink;
use crate::index::LocalIndex;
use crate::payload;
use crate::task::TaskHandle;
use loupe_client::{StoreClient, EVENT_OBJECT_CREATED_ALL, EVENT_OBJECT_REMOVED_ALL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub(crate) struct WatcherParams {
    pub client: Arc<StoreClient>,
    pub index: Arc<LocalIndex>,
    pub bucket: String,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub debounce: Duration,
    pub sink: DeltaSink,
}

pub(crate) fn spawn_watcher(params: WatcherParams) -> TaskHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_watcher(params, shutdown_rx));
    TaskHandle::new(shutdown_tx, task)
}

async fn run_watcher(params: WatcherParams, mut shutdown: watch::Receiver<bool>) {
    let WatcherParams {
        client,
        index,
        bucket,
        prefix,
        suffix,
        debounce,
        sink,
    } = params;

    let batcher = DeltaBatcher::new(debounce, sink, shutdown.clone());

    let events = [EVENT_OBJECT_CREATED_ALL, EVENT_OBJECT_REMOVED_ALL];
    let opening =
        client.listen_notifications(&bucket, prefix.as_deref(), suffix.as_deref(), &events);
    let mut stream = tokio::select! {
        opened = opening => match opened {
            Ok(stream) => stream,
            Err(e) => {
                error!("failed to subscribe to notifications for {}: {}", bucket, e);
                return;
            }
        },
        _ = shutdown.changed() => return,
    };
    info!("subscribed to change notifications for bucket {}", bucket);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("notification watcher for {} stopped", bucket);
                break;
            }
            next = stream.next_payload() => match next {
                Some(Ok(raw)) => ingest(&index, &batcher, &raw),
                Some(Err(e)) => {
                    error!("notification stream for {} failed: {}", bucket, e);
                    break;
                }
                None => {
                    info!("notification stream for {} closed by server", bucket);
                    break;
                }
            }
        }
    }

    // deliver anything still buffered before the task unwinds
    batcher.flush().await;
}

fn ingest(index: &LocalIndex, batcher: &DeltaBatcher, raw: &str) {
    match payload::parse_payload(raw) {
        Ok(deltas) => {
            if deltas.is_empty() {
                return;
            }
            index.apply(&deltas);
            batcher.push(deltas);
        }
        Err(e) => warn!("skipping malformed notification payload: {}", e),
    }
}

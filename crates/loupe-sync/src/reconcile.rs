//! Periodic reconciliation against the authoritative listing
//!
//! The healing half of the engine: on a fixed interval, take a full listing,
//! diff it against the index, apply the corrections, and dispatch them as
//! one batch. A failed listing abandons the iteration and waits for the next
//! tick; the fixed interval is the retry policy.

use crate::delta::{DeltaSink, ObjectDelta};
use crate::diff::diff;
use crate::index::{EntryMeta, LocalIndex};
use crate::task::TaskHandle;
use loupe_client::{ClientError, StoreClient};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub(crate) struct ReconcilerParams {
    pub client: Arc<StoreClient>,
    pub index: Arc<LocalIndex>,
    pub bucket: String,
    pub prefix: Option<String>,
    pub recursive: bool,
    pub interval: Duration,
    pub sink: DeltaSink,
}

pub(crate) fn spawn_reconciler(params: ReconcilerParams) -> TaskHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_reconciler(params, shutdown_rx));
    TaskHandle::new(shutdown_tx, task)
}

async fn run_reconciler(params: ReconcilerParams, mut shutdown: watch::Receiver<bool>) {
    let ReconcilerParams {
        client,
        index,
        bucket,
        prefix,
        recursive,
        interval,
        sink,
    } = params;

    loop {
        let pass = tokio::select! {
            pass = reconcile_once(&client, &index, &bucket, prefix.as_deref(), recursive) => pass,
            _ = shutdown.changed() => break,
        };

        match pass {
            Ok(deltas) if !deltas.is_empty() => {
                info!(
                    "reconciliation corrected {} keys in bucket {}",
                    deltas.len(),
                    bucket
                );
                (sink)(deltas).await;
            }
            Ok(_) => debug!("reconciliation pass found no drift in {}", bucket),
            Err(e) => warn!(
                "reconciliation pass for {} failed, retrying next interval: {}",
                bucket, e
            ),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
    }

    debug!("reconciler for {} stopped", bucket);
}

/// One full listing-diff-apply cycle; returns the corrective deltas
async fn reconcile_once(
    client: &StoreClient,
    index: &LocalIndex,
    bucket: &str,
    prefix: Option<&str>,
    recursive: bool,
) -> Result<Vec<ObjectDelta>, ClientError> {
    let listing = client.list_all_objects(bucket, prefix, recursive).await?;

    let latest: HashMap<String, EntryMeta> = listing
        .into_iter()
        .map(|o| (o.key, EntryMeta::new(o.size, o.last_modified)))
        .collect();

    let deltas = diff(&index.entries(), &latest);
    index.apply(&deltas);
    Ok(deltas)
}

//! Engine facade
//!
//! [`SyncEngine`] wires the pieces together: a validated connection, an
//! optional one-shot seed, one notification watcher task, one reconciler
//! task, and the shared [`LocalIndex`] both producers mutate. Consumers see
//! only delta batches through their registered sink and on-demand
//! snapshots.

use crate::delta::{DeltaSink, ObjectDescriptor};
use crate::index::{EntryMeta, LocalIndex};
use crate::reconcile::{spawn_reconciler, ReconcilerParams};
use crate::task::TaskHandle;
use crate::watcher::{spawn_watcher, WatcherParams};
use crate::{Result, SyncError};
use loupe_client::{StoreClient, StoreConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Default debounce window for real-time delta batching
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Index synchronization engine for one bucket.
///
/// ## Lifecycle
///
/// 1. [`connect`](Self::connect) — validate config and credentials; gates
///    everything else
/// 2. [`seed_index`](Self::seed_index) — optional bulk load of the current
///    listing
/// 3. [`start_watch`](Self::start_watch) — low-cost real-time deltas
/// 4. [`start_reconcile`](Self::start_reconcile) — periodic drift healing
///
/// Dropping the engine stops both background producers and releases the
/// subscription.
pub struct SyncEngine {
    config: StoreConfig,
    debounce: Duration,
    client: Mutex<Option<Arc<StoreClient>>>,
    index: Arc<LocalIndex>,
    watcher: Mutex<Option<TaskHandle>>,
    reconciler: Mutex<Option<TaskHandle>>,
}

impl SyncEngine {
    /// Create a disconnected engine over the given store configuration
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            debounce: DEFAULT_DEBOUNCE,
            client: Mutex::new(None),
            index: Arc::new(LocalIndex::new()),
            watcher: Mutex::new(None),
            reconciler: Mutex::new(None),
        }
    }

    /// Override the debounce window used for real-time delta batching
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Get the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ==================== Connection ====================

    /// Validate the configuration and credentials.
    ///
    /// With a configured bucket its existence is verified; without one, a
    /// bucket listing serves as a lightweight authenticated probe.
    /// Idempotent: connecting while connected is a no-op. Every other
    /// operation requires a prior successful connect.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<()> {
        if self.client.lock().is_some() {
            return Ok(());
        }

        let client = StoreClient::new(self.config.clone()).map_err(SyncError::from_client)?;

        match self.config.bucket.as_deref() {
            Some(bucket) => {
                if !client.bucket_exists(bucket).await? {
                    return Err(SyncError::Config(format!("bucket not found: {}", bucket)));
                }
            }
            None => {
                client.list_buckets().await?;
            }
        }

        info!("connected to {}", self.config.endpoint);
        *self.client.lock() = Some(Arc::new(client));
        Ok(())
    }

    /// Whether a connect has succeeded
    pub fn is_connected(&self) -> bool {
        self.client.lock().is_some()
    }

    fn client(&self) -> Result<Arc<StoreClient>> {
        self.client.lock().clone().ok_or(SyncError::NotConnected)
    }

    fn bucket(&self) -> Result<String> {
        self.config
            .bucket
            .clone()
            .ok_or_else(|| SyncError::Config("no bucket configured".to_string()))
    }

    // ==================== Seeding ====================

    /// One-shot full listing seeding the index; returns the number of
    /// entries loaded.
    ///
    /// Optional: callers may skip it and rely on real-time deltas plus the
    /// first reconciliation pass.
    #[instrument(skip(self))]
    pub async fn seed_index(&self, prefix: Option<&str>, recursive: bool) -> Result<usize> {
        let client = self.client()?;
        let bucket = self.bucket()?;

        let objects = client.list_all_objects(&bucket, prefix, recursive).await?;
        let count = objects.len();
        for object in objects {
            self.index.upsert(
                object.key,
                EntryMeta::new(object.size, object.last_modified),
            );
        }

        info!("seeded index with {} entries from {}", count, bucket);
        Ok(count)
    }

    // ==================== Real-time watch ====================

    /// Subscribe to the bucket's change notifications, feeding accepted
    /// deltas into the index and debounced batches into `sink`.
    ///
    /// Starting while already subscribed replaces the existing
    /// subscription; starting after [`stop_watch`](Self::stop_watch)
    /// creates a fresh one.
    pub fn start_watch(&self, sink: DeltaSink, prefix: Option<&str>) -> Result<()> {
        self.start_watch_filtered(sink, prefix, None)
    }

    /// [`start_watch`](Self::start_watch) with an additional key-suffix
    /// filter (e.g. `".png"`)
    pub fn start_watch_filtered(
        &self,
        sink: DeltaSink,
        prefix: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<()> {
        let client = self.client()?;
        let bucket = self.bucket()?;
        self.stop_watch();

        let handle = spawn_watcher(WatcherParams {
            client,
            index: Arc::clone(&self.index),
            bucket,
            prefix: prefix.map(|p| p.to_string()),
            suffix: suffix.map(|s| s.to_string()),
            debounce: self.debounce,
            sink,
        });
        *self.watcher.lock() = Some(handle);
        Ok(())
    }

    /// Cancel the notification subscription, if any
    pub fn stop_watch(&self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.stop();
        }
    }

    // ==================== Reconciliation ====================

    /// Start the periodic reconciliation loop: list, diff, apply, dispatch,
    /// sleep `interval`, repeat.
    ///
    /// At most one loop runs per engine; starting a new one stops any
    /// existing one first.
    pub fn start_reconcile(
        &self,
        sink: DeltaSink,
        interval: Duration,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<()> {
        let client = self.client()?;
        let bucket = self.bucket()?;
        self.stop_reconcile();

        let handle = spawn_reconciler(ReconcilerParams {
            client,
            index: Arc::clone(&self.index),
            bucket,
            prefix: prefix.map(|p| p.to_string()),
            recursive,
            interval,
            sink,
        });
        *self.reconciler.lock() = Some(handle);
        Ok(())
    }

    /// Cancel the reconciliation loop, if any
    pub fn stop_reconcile(&self) {
        if let Some(handle) = self.reconciler.lock().take() {
            handle.stop();
        }
    }

    // ==================== Queries ====================

    /// Key-ordered snapshot of the index at this instant
    pub fn snapshot(&self) -> Vec<ObjectDescriptor> {
        self.index.snapshot()
    }

    /// Point lookup of one key
    pub fn get(&self, key: &str) -> Option<ObjectDescriptor> {
        self.index.get(key).map(|meta| ObjectDescriptor {
            key: key.to_string(),
            size: meta.size,
            last_modified: meta.last_modified,
        })
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop_watch();
        self.stop_reconcile();
    }
}

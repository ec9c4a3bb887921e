//! # Loupe Sync
//!
//! Eventually-consistent local mirror of an S3-compatible bucket's key set.
//!
//! The engine reconciles two independent, racing sources of truth — push
//! notifications and pull listings — into one local index, under bounded
//! API cost, and exposes incremental change batches to a registered
//! consumer.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       SyncEngine                          │
//! │  connect · seed_index · start_watch · start_reconcile     │
//! ├──────────────────────────┬────────────────────────────────┤
//! │   Notification watcher   │          Reconciler            │
//! │  payload sniff + decode  │   full listing diff + apply    │
//! │     debounce batching    │     one batch per pass         │
//! ├──────────────────────────┴────────────────────────────────┤
//! │                 LocalIndex (key → metadata)               │
//! ├───────────────────────────────────────────────────────────┤
//! │               loupe-client (S3-compatible)                │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use loupe_sync::{DeltaSink, SyncEngine};
//! use loupe_client::StoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = SyncEngine::new(
//!         StoreConfig::new("http://localhost:9000")
//!             .with_credentials("minioadmin", "minioadmin")
//!             .with_bucket("inspection"),
//!     );
//!
//!     engine.connect().await?;
//!     engine.seed_index(None, true).await?;
//!
//!     let sink: DeltaSink = Arc::new(|batch| {
//!         Box::pin(async move {
//!             for delta in batch {
//!                 println!("{:?} {}", delta.kind, delta.key);
//!             }
//!         })
//!     });
//!
//!     engine.start_watch(sink.clone(), None)?;
//!     engine.start_reconcile(sink, Duration::from_secs(1800), None, true)?;
//!
//!     Ok(())
//! }
//! ```

mod batch;
pub mod delta;
pub mod diff;
mod engine;
mod error;
pub mod index;
pub mod payload;
mod reconcile;
mod task;
mod watcher;

pub use delta::{DeltaKind, DeltaSink, ObjectDelta, ObjectDescriptor};
pub use diff::diff;
pub use engine::{SyncEngine, DEFAULT_DEBOUNCE};
pub use error::{Result, SyncError};
pub use index::{EntryMeta, LocalIndex};
pub use payload::{parse_payload, PayloadError};

// Consumers configure the engine with the client's config type
pub use loupe_client::StoreConfig;

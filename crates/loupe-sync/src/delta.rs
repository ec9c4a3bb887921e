//! Change records exchanged with consumers

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The two kinds of observable change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaKind {
    /// The key was created or its metadata changed
    AddedOrUpdated,
    /// The key no longer exists remotely
    Removed,
}

/// A single change record for one key.
///
/// Deltas are the only externally observable change representation; they are
/// immutable value records. A [`Removed`](DeltaKind::Removed) delta carries
/// no size or timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDelta {
    /// What happened
    pub kind: DeltaKind,
    /// Object key
    pub key: String,
    /// Size in bytes, when known
    pub size: Option<i64>,
    /// Last modified time, when known
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectDelta {
    /// A creation or in-place update for `key`
    pub fn added_or_updated(
        key: impl Into<String>,
        size: Option<i64>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            kind: DeltaKind::AddedOrUpdated,
            key: key.into(),
            size,
            last_modified,
        }
    }

    /// A removal of `key`
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            kind: DeltaKind::Removed,
            key: key.into(),
            size: None,
            last_modified: None,
        }
    }
}

/// Last known remote state of one object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object key; the unique identity
    pub key: String,
    /// Size in bytes, when known
    pub size: Option<i64>,
    /// Last modified time, when known
    pub last_modified: Option<DateTime<Utc>>,
}

/// Async consumer callback receiving delta batches.
///
/// Invoked at most once per debounce window or per reconciliation pass, and
/// never with an empty batch. Retries and backpressure are the consumer's
/// responsibility.
pub type DeltaSink = Arc<dyn Fn(Vec<ObjectDelta>) -> BoxFuture<'static, ()> + Send + Sync>;

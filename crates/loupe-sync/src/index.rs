//! Concurrent local index of remote object metadata

use crate::delta::{DeltaKind, ObjectDelta, ObjectDescriptor};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;

/// Metadata tracked per key
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EntryMeta {
    /// Size in bytes, when known
    pub size: Option<i64>,
    /// Last modified time, when known
    pub last_modified: Option<DateTime<Utc>>,
}

impl EntryMeta {
    /// Build from the optional size/timestamp pair
    pub fn new(size: Option<i64>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            size,
            last_modified,
        }
    }
}

/// In-memory key → metadata mirror of a bucket.
///
/// Both producers (the notification watcher and the reconciler) mutate the
/// index concurrently; per-key upsert/remove are atomic and no external
/// locking is required. Absence of a key is indistinguishable from never
/// having observed it; removals delete the entry outright.
#[derive(Default)]
pub struct LocalIndex {
    entries: DashMap<String, EntryMeta>,
}

impl LocalIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Point lookup
    pub fn get(&self, key: &str) -> Option<EntryMeta> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    /// Insert or overwrite one key
    pub fn upsert(&self, key: impl Into<String>, meta: EntryMeta) {
        self.entries.insert(key.into(), meta);
    }

    /// Remove one key; removing an absent key is a no-op
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a delta batch in order, last write per key winning
    pub fn apply(&self, deltas: &[ObjectDelta]) {
        for delta in deltas {
            match delta.kind {
                DeltaKind::AddedOrUpdated => {
                    self.upsert(&delta.key, EntryMeta::new(delta.size, delta.last_modified));
                }
                DeltaKind::Removed => self.remove(&delta.key),
            }
        }
    }

    /// Point-in-time copy of the whole index, for diffing
    pub fn entries(&self) -> HashMap<String, EntryMeta> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Key-ordered snapshot for display and tests
    pub fn snapshot(&self) -> Vec<ObjectDescriptor> {
        let mut descriptors: Vec<ObjectDescriptor> = self
            .entries
            .iter()
            .map(|entry| ObjectDescriptor {
                key: entry.key().clone(),
                size: entry.value().size,
                last_modified: entry.value().last_modified,
            })
            .collect();
        descriptors.sort_by(|a, b| a.key.cmp(&b.key));
        descriptors
    }
}

//! Listing-versus-index diffing
//!
//! The corrective half of the engine: given what the index currently holds
//! and what a full listing just reported, produce the exact set of deltas
//! that makes the index match the listing.

use crate::delta::ObjectDelta;
use crate::index::EntryMeta;
use std::collections::HashMap;

/// Compute the delta batch turning `current` into `latest`.
///
/// Every key in `latest` that is absent from `current` or differs in size or
/// last-modified yields one `AddedOrUpdated`; every key in `current` absent
/// from `latest` yields one `Removed`. Order within the batch is
/// unspecified.
pub fn diff(
    current: &HashMap<String, EntryMeta>,
    latest: &HashMap<String, EntryMeta>,
) -> Vec<ObjectDelta> {
    let mut deltas = Vec::new();

    for (key, meta) in latest {
        match current.get(key) {
            Some(old) if old == meta => {}
            _ => deltas.push(ObjectDelta::added_or_updated(
                key.clone(),
                meta.size,
                meta.last_modified,
            )),
        }
    }

    for key in current.keys() {
        if !latest.contains_key(key) {
            deltas.push(ObjectDelta::removed(key.clone()));
        }
    }

    deltas
}

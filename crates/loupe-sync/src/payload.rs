//! Notification payload decoding
//!
//! A subscription can deliver two payload shapes: the usual JSON event
//! document (a `Records` array), or a full listing XML document from
//! notification systems that echo listings instead of discrete events. The
//! shape is sniffed from the first non-whitespace byte; both branches
//! normalize into the same [`ObjectDelta`] representation and stay
//! independently testable.

use crate::delta::ObjectDelta;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Failure to decode one notification payload.
///
/// Local to the payload: the subscription survives, the payload is logged
/// and skipped, and the index is left untouched.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Payload was empty or whitespace
    #[error("empty payload")]
    Empty,

    /// Malformed JSON notification document
    #[error("JSON notification: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed listing XML document
    #[error("listing XML: {0}")]
    Xml(String),
}

/// Event-name prefix for the object-created family
const CREATED_PREFIX: &str = "s3:ObjectCreated";
/// Event-name prefix for the object-removed family
const REMOVED_PREFIX: &str = "s3:ObjectRemoved";

/// Decode one raw payload into deltas, sniffing the wire shape
pub fn parse_payload(payload: &str) -> Result<Vec<ObjectDelta>, PayloadError> {
    match payload.trim_start().as_bytes().first() {
        None => Err(PayloadError::Empty),
        Some(b'<') => parse_listing_payload(payload),
        Some(_) => parse_records_payload(payload),
    }
}

/// Listing-style payload: every `Contents` entry is a create/update
fn parse_listing_payload(payload: &str) -> Result<Vec<ObjectDelta>, PayloadError> {
    let page =
        loupe_client::xml::parse_listing(payload).map_err(|e| PayloadError::Xml(e.to_string()))?;

    Ok(page
        .objects
        .into_iter()
        .map(|o| ObjectDelta::added_or_updated(o.key, o.size, o.last_modified))
        .collect())
}

#[derive(Debug, Deserialize)]
struct NotificationDocument {
    #[serde(rename = "Records", default)]
    records: Option<Vec<NotificationRecord>>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    #[serde(rename = "eventTime", default)]
    event_time: Option<String>,
    #[serde(default)]
    s3: Option<RecordS3>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordS3 {
    #[serde(default)]
    object: Option<RecordObject>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordObject {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    size: Option<i64>,
}

/// Notification-style payload: classify each record by event-name family.
/// Records missing a key or event name are skipped, as are unknown families.
fn parse_records_payload(payload: &str) -> Result<Vec<ObjectDelta>, PayloadError> {
    let doc: NotificationDocument = serde_json::from_str(payload)?;

    let mut deltas = Vec::new();
    for record in doc.records.unwrap_or_default() {
        let Some(event_name) = record.event_name.filter(|n| !n.is_empty()) else {
            continue;
        };

        let object = record.s3.and_then(|s3| s3.object);
        let (key, size) = match object {
            Some(o) => (o.key, o.size),
            None => (None, None),
        };
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            continue;
        };

        if event_name.starts_with(CREATED_PREFIX) {
            let time = record.event_time.as_deref().and_then(parse_event_time);
            deltas.push(ObjectDelta::added_or_updated(key, size, time));
        } else if event_name.starts_with(REMOVED_PREFIX) {
            deltas.push(ObjectDelta::removed(key));
        }
    }

    Ok(deltas)
}

fn parse_event_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

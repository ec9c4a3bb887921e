//! Common types for the store client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object as reported by a bucket listing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Object key
    pub key: String,
    /// Size in bytes, when the listing reported one
    pub size: Option<i64>,
    /// Last modified time, when the listing reported one
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag, entity-decoded and with surrounding quotes stripped
    pub etag: Option<String>,
}

/// A bucket visible to the configured credentials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,
    /// Creation date
    pub creation_date: Option<DateTime<Utc>>,
}

/// One page of a bucket listing
#[derive(Clone, Debug, Default)]
pub struct ListObjectsPage {
    /// Objects on this page
    pub objects: Vec<RemoteObject>,
    /// Common prefixes (directory-style groupings) when a delimiter was set
    pub common_prefixes: Vec<String>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Token for fetching the next page
    pub next_continuation_token: Option<String>,
}

/// Options for a single listing request
#[derive(Clone, Debug, Default)]
pub struct ListObjectsQuery {
    /// Filter by key prefix
    pub prefix: Option<String>,
    /// Delimiter for grouping keys into common prefixes
    pub delimiter: Option<String>,
    /// Maximum keys to return on this page
    pub max_keys: Option<usize>,
    /// Continuation token from the previous page
    pub continuation_token: Option<String>,
}

impl ListObjectsQuery {
    /// Query for a full (optionally prefix-scoped) listing
    pub fn with_prefix(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(|p| p.to_string()),
            ..Default::default()
        }
    }
}

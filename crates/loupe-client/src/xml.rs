//! Listing XML decoding
//!
//! Namespace-aware decoding of S3 `ListBucketResult` / `ListAllMyBucketsResult`
//! documents. Matching is on local element names, so documents with a default
//! namespace, a prefixed namespace, or no namespace at all decode the same
//! way. Text is entity-decoded (ETags in particular arrive HTML-escaped from
//! some servers).

use crate::{ClientError, ListObjectsPage, RemoteObject, Result};
use crate::types::BucketInfo;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Decode one `ListBucketResult` page
pub fn parse_listing(xml: &str) -> Result<ListObjectsPage> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = ListObjectsPage::default();
    let mut current: Option<RemoteObject> = None;
    let mut in_common_prefixes = false;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"Contents" => current = Some(RemoteObject::default()),
                    b"CommonPrefixes" => in_common_prefixes = true,
                    _ => field = Some(name),
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ClientError::Xml(e.to_string()))?
                    .into_owned();
                let Some(field) = field.as_deref() else {
                    continue;
                };
                if let Some(obj) = current.as_mut() {
                    match field {
                        b"Key" => obj.key = text,
                        b"Size" => obj.size = text.parse().ok(),
                        b"LastModified" => obj.last_modified = parse_timestamp(&text),
                        b"ETag" => obj.etag = Some(text.trim_matches('"').to_string()),
                        _ => {}
                    }
                } else if in_common_prefixes && field == b"Prefix" {
                    page.common_prefixes.push(text);
                } else {
                    match field {
                        b"IsTruncated" => page.is_truncated = text == "true",
                        b"NextContinuationToken" => page.next_continuation_token = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"Contents" => {
                    if let Some(obj) = current.take() {
                        if !obj.key.is_empty() {
                            page.objects.push(obj);
                        }
                    }
                }
                b"CommonPrefixes" => in_common_prefixes = false,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ClientError::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(page)
}

/// Decode a `ListAllMyBucketsResult` document
pub fn parse_bucket_list(xml: &str) -> Result<Vec<BucketInfo>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buckets = Vec::new();
    let mut current: Option<BucketInfo> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"Bucket" {
                    current = Some(BucketInfo {
                        name: String::new(),
                        creation_date: None,
                    });
                } else {
                    field = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ClientError::Xml(e.to_string()))?
                    .into_owned();
                if let (Some(bucket), Some(field)) = (current.as_mut(), field.as_deref()) {
                    match field {
                        b"Name" => bucket.name = text,
                        b"CreationDate" => bucket.creation_date = parse_timestamp(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"Bucket" {
                    if let Some(bucket) = current.take() {
                        if !bucket.name.is_empty() {
                            buckets.push(bucket);
                        }
                    }
                } else {
                    field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ClientError::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(buckets)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

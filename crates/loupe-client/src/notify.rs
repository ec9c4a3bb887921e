//! Bucket change-notification stream
//!
//! MinIO-style `ListenBucketNotification` keeps an HTTP response open
//! indefinitely and writes one JSON document per line, with blank lines as
//! keepalives. [`NotificationStream`] turns that byte stream into a sequence
//! of raw payload strings; it does not interpret them.

use crate::{ClientError, Result};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

/// Event filter covering the whole object-created family
pub const EVENT_OBJECT_CREATED_ALL: &str = "s3:ObjectCreated:*";
/// Event filter covering the whole object-removed family
pub const EVENT_OBJECT_REMOVED_ALL: &str = "s3:ObjectRemoved:*";

/// A live subscription to a bucket's notification stream.
///
/// The subscription is torn down by dropping the stream; a pending
/// [`next_payload`](Self::next_payload) is unblocked by cancelling the task
/// awaiting it.
pub struct NotificationStream {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
    buf: Vec<u8>,
    done: bool,
}

impl NotificationStream {
    pub(crate) fn new(
        stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    ) -> Self {
        Self {
            stream: stream.boxed(),
            buf: Vec::new(),
            done: false,
        }
    }

    /// Await the next raw notification payload.
    ///
    /// Returns `None` once the server closes the stream; a transport error is
    /// yielded once and the stream is finished afterwards. Keepalive blank
    /// lines are skipped.
    pub async fn next_payload(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line);
                let text = text.trim();
                if !text.is_empty() {
                    return Some(Ok(text.to_string()));
                }
                continue;
            }

            if self.done {
                return None;
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ClientError::Http(e)));
                }
                None => {
                    // stream closed; flush whatever is left without a newline
                    self.done = true;
                    let text = String::from_utf8_lossy(&self.buf).trim().to_string();
                    self.buf.clear();
                    if !text.is_empty() {
                        return Some(Ok(text));
                    }
                    return None;
                }
            }
        }
    }
}

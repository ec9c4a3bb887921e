//! # Loupe Client
//!
//! A thin client for S3-compatible object stores, covering exactly the
//! surface the Loupe index-synchronization engine needs:
//!
//! - **Bucket probes**: existence checks and credential validation
//! - **Listings**: paginated `ListObjectsV2` with prefix/delimiter scoping
//! - **Notifications**: MinIO-style `ListenBucketNotification` long poll
//! - **Signing**: AWS Signature V2 for access/secret key pairs
//!
//! ## Example
//!
//! ```rust,ignore
//! use loupe_client::{StoreClient, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StoreConfig::new("http://localhost:9000")
//!         .with_credentials("minioadmin", "minioadmin")
//!         .with_bucket("inspection");
//!
//!     let client = StoreClient::new(config)?;
//!     let objects = client.list_all_objects("inspection", None, true).await?;
//!     println!("{} objects", objects.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod notify;
mod sign;
mod types;
pub mod xml;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use error::{ClientError, Result};
pub use notify::{NotificationStream, EVENT_OBJECT_CREATED_ALL, EVENT_OBJECT_REMOVED_ALL};
pub use types::*;

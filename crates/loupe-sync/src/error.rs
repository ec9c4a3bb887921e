//! Engine error types

use loupe_client::ClientError;
use thiserror::Error;

/// Result type alias using `SyncError`
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the sync engine
#[derive(Error, Debug)]
pub enum SyncError {
    /// Bad or missing endpoint, credentials, or bucket; fatal to connect
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation attempted before a successful connect
    #[error("not connected: call connect() first")]
    NotConnected,

    /// Transport or protocol failure at the store boundary
    #[error("store client error: {0}")]
    Client(#[from] ClientError),
}

impl SyncError {
    /// Collapse client-side configuration rejections into the engine's own
    /// configuration error
    pub(crate) fn from_client(err: ClientError) -> Self {
        match err {
            ClientError::Config(msg) => Self::Config(msg),
            other => Self::Client(other),
        }
    }
}

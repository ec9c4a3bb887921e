//! Client configuration

use crate::{ClientError, Result};
use std::time::Duration;
use url::Url;

/// Connection settings for an S3-compatible endpoint
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Endpoint URL, e.g. `https://minio.example.com:9000`
    pub endpoint: String,
    /// Access key
    pub access_key: String,
    /// Secret key
    pub secret_key: String,
    /// Default bucket (optional; operations that need one fail without it)
    pub bucket: Option<String>,
    /// Timeout for unary requests (listings, existence probes).
    /// The notification long poll is exempt.
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("loupe-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl StoreConfig {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the access/secret key pair
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    /// Set the default bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Set the unary request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the endpoint uses TLS, derived from the URL scheme
    pub fn use_tls(&self) -> bool {
        self.endpoint.trim_start().starts_with("https://")
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Check that the config is usable: non-empty parseable endpoint and
    /// non-empty credentials
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::Config("endpoint URL is empty".to_string()));
        }
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ClientError::Config(format!("invalid endpoint URL: {}", e)))?;
        if url.host_str().is_none() {
            return Err(ClientError::Config(format!(
                "endpoint URL has no host: {}",
                self.endpoint
            )));
        }
        if self.access_key.trim().is_empty() || self.secret_key.trim().is_empty() {
            return Err(ClientError::Config(
                "access key and secret key must be set".to_string(),
            ));
        }
        Ok(())
    }
}

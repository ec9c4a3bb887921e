//! Main client implementation

use crate::types::BucketInfo;
use crate::{
    sign, xml, ClientError, ListObjectsPage, ListObjectsQuery, NotificationStream, RemoteObject,
    Result, StoreConfig,
};
use chrono::Utc;
use reqwest::{Client, Method, Response};
use tracing::{debug, instrument};

/// S3-compatible store client
pub struct StoreClient {
    config: StoreConfig,
    http: Client,
}

impl StoreClient {
    /// Create a new client with the given configuration.
    ///
    /// The configuration is validated up front; an empty endpoint or empty
    /// credentials never reach the wire.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        // No global timeout on the pool: the notification long poll must be
        // allowed to idle. Unary requests get a per-request timeout instead.
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { config, http })
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ==================== Bucket Operations ====================

    /// List all buckets visible to the configured credentials.
    ///
    /// Also serves as a lightweight authenticated probe when no bucket is
    /// configured.
    #[instrument(skip(self))]
    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let response = self.request(Method::GET, "/", &[], false).await?;
        let text = response.text().await?;
        xml::parse_bucket_list(&text)
    }

    /// Check if a bucket exists
    #[instrument(skip(self))]
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let path = format!("/{}", bucket);
        match self.request(Method::HEAD, &path, &[], false).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ==================== Object Operations ====================

    /// List one page of objects in a bucket
    #[instrument(skip(self, query))]
    pub async fn list_objects(
        &self,
        bucket: &str,
        query: &ListObjectsQuery,
    ) -> Result<ListObjectsPage> {
        let mut params = vec![("list-type", "2".to_string())];

        if let Some(prefix) = &query.prefix {
            params.push(("prefix", prefix.clone()));
        }
        if let Some(delimiter) = &query.delimiter {
            params.push(("delimiter", delimiter.clone()));
        }
        if let Some(max_keys) = query.max_keys {
            params.push(("max-keys", max_keys.to_string()));
        }
        if let Some(token) = &query.continuation_token {
            params.push(("continuation-token", token.clone()));
        }

        let path = format!("/{}", bucket);
        let response = self.request(Method::GET, &path, &params, false).await?;
        let text = response.text().await?;
        xml::parse_listing(&text)
    }

    /// Full listing of a bucket, following continuation tokens to the last
    /// page. `recursive = false` lists with a `/` delimiter, so only keys
    /// above the first delimiter are returned.
    #[instrument(skip(self))]
    pub async fn list_all_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<RemoteObject>> {
        let mut query = ListObjectsQuery::with_prefix(prefix);
        if !recursive {
            query.delimiter = Some("/".to_string());
        }

        let mut objects = Vec::new();
        loop {
            let page = self.list_objects(bucket, &query).await?;
            objects.extend(page.objects);

            if !page.is_truncated {
                break;
            }
            let token = page.next_continuation_token.ok_or_else(|| {
                ClientError::InvalidResponse(
                    "truncated listing without continuation token".to_string(),
                )
            })?;
            query.continuation_token = Some(token);
        }

        debug!("listed {} objects from bucket {}", objects.len(), bucket);
        Ok(objects)
    }

    // ==================== Notifications ====================

    /// Open the change-notification long poll for a bucket, filtered by an
    /// optional key prefix/suffix and a set of event classes
    /// (e.g. [`EVENT_OBJECT_CREATED_ALL`](crate::EVENT_OBJECT_CREATED_ALL)).
    #[instrument(skip(self))]
    pub async fn listen_notifications(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        suffix: Option<&str>,
        events: &[&str],
    ) -> Result<NotificationStream> {
        let mut params: Vec<(&str, String)> = vec![
            ("prefix", prefix.unwrap_or_default().to_string()),
            ("suffix", suffix.unwrap_or_default().to_string()),
        ];
        for event in events {
            params.push(("events", event.to_string()));
        }

        let path = format!("/{}", bucket);
        let response = self.request(Method::GET, &path, &params, true).await?;
        Ok(NotificationStream::new(response.bytes_stream()))
    }

    // ==================== Helper Methods ====================

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        long_poll: bool,
    ) -> Result<Response> {
        let url = format!("{}{}", self.config.base_url(), path);

        // V2 signing: none of the query parameters used here are
        // subresources, so the canonicalized resource is just the path
        let date = sign::http_date(Utc::now());
        let auth = sign::authorization(
            &self.config.access_key,
            &self.config.secret_key,
            method.as_str(),
            &date,
            path,
        );

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("Date", date)
            .header("Authorization", auth);

        if !query.is_empty() {
            req = req.query(query);
        }
        if !long_poll {
            req = req.timeout(self.config.timeout);
        }

        debug!("sending {} request to {}", method, url);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_s3_xml(&text, status.as_u16()));
        }

        Ok(response)
    }
}

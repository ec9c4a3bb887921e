//! Client error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// S3 API error
    #[error("S3 error ({code}): {message}")]
    S3 {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Bucket not found
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
}

impl ClientError {
    /// Parse an S3 error from an XML response body
    pub fn from_s3_xml(xml: &str, status: u16) -> Self {
        // Error bodies are small and flat; tag scanning is enough here
        let code = extract_xml_element(xml, "Code").unwrap_or_else(|| format!("HTTP{}", status));
        let message =
            extract_xml_element(xml, "Message").unwrap_or_else(|| "unknown error".to_string());
        let request_id = extract_xml_element(xml, "RequestId");

        Self::S3 {
            code,
            message,
            request_id,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BucketNotFound(_))
            || matches!(self, Self::S3 { code, .. } if code == "NoSuchKey" || code == "NoSuchBucket" || code == "HTTP404")
    }

    /// Check if this is an access denied error
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::S3 { code, .. } if code == "AccessDenied" || code == "SignatureDoesNotMatch")
    }
}

fn extract_xml_element(xml: &str, element: &str) -> Option<String> {
    let start_tag = format!("<{}>", element);
    let end_tag = format!("</{}>", element);

    let start = xml.find(&start_tag)? + start_tag.len();
    let end = xml[start..].find(&end_tag)? + start;

    Some(xml[start..end].to_string())
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Stable machine-readable error codes.
///
/// These are the values callers (and the JSON error report) match on, so
/// the serialized spelling is part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FetchError,
    InvalidContentType,
    EmptyResponse,
    TimeoutError,
    ParseError,
    InvalidStructure,
    ProcessingError,
    ValidationError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::FetchError => "FETCH_ERROR",
            ErrorCode::InvalidContentType => "INVALID_CONTENT_TYPE",
            ErrorCode::EmptyResponse => "EMPTY_RESPONSE",
            ErrorCode::TimeoutError => "TIMEOUT_ERROR",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::InvalidStructure => "INVALID_STRUCTURE",
            ErrorCode::ProcessingError => "PROCESSING_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while fetching, normalizing or validating a feed.
///
/// Every variant maps to one [`ErrorCode`] and carries the details needed to
/// diagnose it. The cache never produces these; it treats its own faults as
/// misses.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP response with a non-2xx status code
    #[error("Failed to fetch RSS feed: {status} {status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// Feed URL rejected before any request was made
    #[error("Invalid feed URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network-level error (DNS, connection, TLS, reset)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// Response body exceeded the configured size limit
    #[error("Response too large (exceeds {limit} bytes)")]
    ResponseTooLarge { limit: usize },

    /// Connection closed before Content-Length bytes arrived
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },

    /// Content-Type header missing or not an XML type
    #[error("Invalid content type: expected XML")]
    InvalidContentType { content_type: Option<String> },

    /// Body was empty after trimming whitespace
    #[error("Empty RSS feed response")]
    EmptyResponse,

    /// The attempt exceeded the request timeout
    #[error("Request timeout after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// XML could not be read, or a transient failure outlived the retry budget
    #[error("Failed to parse RSS feed: {message}")]
    Parse {
        message: String,
        retries: u32,
        #[source]
        cause: Option<Box<FeedError>>,
    },

    /// The document has no recognizable RSS, Atom or RDF root
    #[error("Invalid RSS feed structure: {0}")]
    InvalidStructure(String),

    /// The document is well-formed but could not be turned into a feed
    #[error("Failed to process RSS data: {0}")]
    Processing(String),

    /// The caller-invoked validation gate rejected the feed
    #[error("Feed validation failed: {}", .errors.join(", "))]
    Validation { errors: Vec<String> },
}

impl FeedError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FeedError::HttpStatus { .. }
            | FeedError::InvalidUrl { .. }
            | FeedError::Network(_)
            | FeedError::ResponseTooLarge { .. }
            | FeedError::IncompleteResponse { .. } => ErrorCode::FetchError,
            FeedError::InvalidContentType { .. } => ErrorCode::InvalidContentType,
            FeedError::EmptyResponse => ErrorCode::EmptyResponse,
            FeedError::Timeout { .. } => ErrorCode::TimeoutError,
            FeedError::Parse { .. } => ErrorCode::ParseError,
            FeedError::InvalidStructure(_) => ErrorCode::InvalidStructure,
            FeedError::Processing(_) => ErrorCode::ProcessingError,
            FeedError::Validation { .. } => ErrorCode::ValidationError,
        }
    }

    /// Returns true if this error is transient and the request should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Timeout { .. } | FeedError::IncompleteResponse { .. } => true,
            FeedError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FeedError::HttpStatus { .. }
            | FeedError::InvalidUrl { .. }
            | FeedError::ResponseTooLarge { .. }
            | FeedError::InvalidContentType { .. }
            | FeedError::EmptyResponse
            | FeedError::Parse { .. }
            | FeedError::InvalidStructure(_)
            | FeedError::Processing(_)
            | FeedError::Validation { .. } => false,
        }
    }

    /// Transport failures that reach the caller are reported as parse errors
    /// wrapping the final cause, together with the retries spent on them.
    pub(crate) fn exhausted(self, retries: u32) -> FeedError {
        FeedError::Parse {
            message: self.to_string(),
            retries,
            cause: Some(Box::new(self)),
        }
    }

    /// Structured diagnostic details for this error.
    pub fn details(&self) -> Value {
        match self {
            FeedError::HttpStatus {
                status,
                status_text,
            } => json!({ "status": status, "statusText": status_text }),
            FeedError::InvalidUrl { url, reason } => json!({ "url": url, "reason": reason }),
            FeedError::Network(e) => json!({
                "originalError": e.to_string(),
                "timeout": e.is_timeout(),
                "connect": e.is_connect(),
            }),
            FeedError::ResponseTooLarge { limit } => json!({ "limit": limit }),
            FeedError::IncompleteResponse { expected, received } => {
                json!({ "expected": expected, "received": received })
            }
            FeedError::InvalidContentType { content_type } => {
                json!({ "contentType": content_type })
            }
            FeedError::EmptyResponse => json!({}),
            FeedError::Timeout { timeout } => json!({ "timeout": timeout.as_millis() as u64 }),
            FeedError::Parse {
                message,
                retries,
                cause,
            } => json!({
                "originalError": message,
                "retries": retries,
                "cause": cause.as_ref().map(|c| c.code()),
            }),
            FeedError::InvalidStructure(_) => json!({}),
            FeedError::Processing(message) => json!({ "originalError": message }),
            FeedError::Validation { errors } => json!({ "errors": errors }),
        }
    }

    /// Serializable view of this error for API and CLI consumers.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            name: ErrorReport::NAME.to_string(),
            message: self.to_string(),
            code: self.code(),
            details: self.details(),
        }
    }
}

/// The wire shape of a failed feed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub name: String,
    pub message: String,
    pub code: ErrorCode,
    pub details: Value,
}

impl ErrorReport {
    pub const NAME: &'static str = "RSSParserError";
}

impl From<&FeedError> for ErrorReport {
    fn from(err: &FeedError) -> Self {
        err.report()
    }
}

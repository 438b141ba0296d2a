use std::collections::BTreeMap;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE, USER_AGENT};

use super::error::FeedError;
use crate::util::{validate_url, HostPolicy};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; CentennialHillsHomes/1.0)";
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

const ACCEPT_FEEDS: &str = "application/rss+xml, application/xml, text/xml, */*";

/// Transport settings for [`FeedFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Upper bound for one attempt, covering the request and the body read
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base of the exponential backoff schedule
    pub retry_delay: Duration,
    pub user_agent: String,
    pub max_body_bytes: usize,
    pub host_policy: HostPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: MAX_FEED_SIZE,
            host_policy: HostPolicy::PublicOnly,
        }
    }
}

/// Per-call fetch options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Attempt counter to start from. Callers resuming a retry sequence pass
    /// the number of attempts already spent.
    pub retries: u32,
    /// Extra request headers; these override the defaults by name.
    pub headers: BTreeMap<String, String>,
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
///
/// ```
/// use std::time::Duration;
/// use marketfeed::feed::backoff_delay;
///
/// let base = Duration::from_millis(1000);
/// assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
/// assert_eq!(backoff_delay(base, 2), Duration::from_millis(4000));
/// ```
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Retrieves raw feed XML over HTTP.
///
/// Each attempt is bounded by [`FetcherConfig::timeout`]. Timeouts,
/// connection failures and truncated bodies are retried up to
/// `max_retries` times with exponential backoff; anything else, including
/// every non-2xx status, fails immediately. A transient failure that outlives the retry budget is
/// returned as [`FeedError::Parse`] wrapping the last cause.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client, config: FetcherConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch `url` and return the response body as text.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidUrl`] - not http(s), or a private host under
    ///   [`HostPolicy::PublicOnly`]; no request is made
    /// - [`FeedError::HttpStatus`] - any non-2xx response
    /// - [`FeedError::InvalidContentType`] - missing or non-XML Content-Type
    /// - [`FeedError::EmptyResponse`] - body is empty or whitespace
    /// - [`FeedError::ResponseTooLarge`] - body exceeds `max_body_bytes`
    /// - [`FeedError::Parse`] - retries exhausted, or a non-retryable
    ///   transport failure; `cause` holds the underlying error
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, FeedError> {
        let url = validate_url(url, self.config.host_policy).map_err(|e| FeedError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let headers = self.request_headers(&options.headers);

        let mut attempt = options.retries;
        loop {
            match self.attempt(&url, &headers).await {
                Ok(body) => {
                    tracing::debug!(url = %url, attempt = attempt, bytes = body.len(), "Fetched feed");
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(self.config.retry_delay, attempt);
                    tracing::warn!(
                        url = %url,
                        retry = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Feed fetch failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() || matches!(e, FeedError::Network(_)) => {
                    tracing::warn!(url = %url, retries = attempt, error = %e, "Feed fetch gave up");
                    return Err(e.exhausted(attempt));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One request/response cycle under the configured timeout.
    async fn attempt(&self, url: &url::Url, headers: &HeaderMap) -> Result<String, FeedError> {
        let timeout = self.config.timeout;
        tokio::time::timeout(timeout, self.request(url, headers))
            .await
            .map_err(|_| FeedError::Timeout { timeout })?
    }

    async fn request(&self, url: &url::Url, headers: &HeaderMap) -> Result<String, FeedError> {
        let response = self
            .client
            .get(url.as_str())
            .headers(headers.clone())
            .send()
            .await
            .map_err(FeedError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"))
        {
            return Err(FeedError::InvalidContentType { content_type });
        }

        let bytes = read_limited_bytes(response, self.config.max_body_bytes).await?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(FeedError::EmptyResponse);
        }

        Ok(text.to_string())
    }

    fn request_headers(&self, overrides: &BTreeMap<String, String>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_FEEDS));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        for (name, value) in overrides {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Ignoring invalid request header"),
            }
        }
        headers
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FeedError::ResponseTooLarge { limit });
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FeedError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::ResponseTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FeedError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

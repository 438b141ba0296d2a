//! Configuration file parser for ~/.config/marketfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::{
    FetcherConfig, NormalizerOptions, DEFAULT_AUTHOR, DEFAULT_CATEGORY, DEFAULT_EXCERPT_WORDS,
    DEFAULT_SOURCE, DEFAULT_USER_AGENT, DEFAULT_WORDS_PER_MINUTE, MAX_FEED_SIZE,
};
use crate::storage::{CacheSlot, DEFAULT_CAPACITY};
use crate::util::HostPolicy;

/// Primary market insights feed
pub const DEFAULT_FEED_URL: &str =
    "https://www.simplifyingthemarket.com/en/feed?a=956758-ef2edda2f940e018328655620ea05f18";

/// Alternate address tried when the primary feed fails
pub const ALTERNATE_FEED_URL: &str =
    "https://www.simplifyingthemarket.com/en/?a=956758-ef2edda2f940e018328655620ea05f18";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// SEC-015: Custom Debug impl masks `analytics_token` to prevent secret
/// leakage in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed loaded when no URL is given on the command line.
    pub feed_url: String,

    /// Tried in order when `feed_url` fails.
    pub fallback_urls: Vec<String>,

    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (doubled per retry).
    pub retry_delay_ms: u64,

    pub user_agent: String,

    /// How long a fetched feed stays fresh in the cache.
    pub cache_ttl_secs: u64,

    /// Maximum number of cached entries.
    pub cache_capacity: usize,

    pub excerpt_words: usize,

    pub words_per_minute: usize,

    pub default_author: String,

    pub default_category: String,

    /// Label stamped on every article's `source`.
    pub source_label: String,

    /// Collector URL for analytics events. Unset logs them instead.
    pub analytics_endpoint: Option<String>,

    /// Bearer token for the analytics endpoint (alternative to the
    /// MARKETFEED_ANALYTICS_TOKEN env var, which takes precedence).
    pub analytics_token: Option<String>,

    /// Permit feed URLs on localhost and private networks.
    pub allow_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            fallback_urls: vec![ALTERNATE_FEED_URL.to_string()],
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_ttl_secs: CacheSlot::Feed.ttl().as_secs(),
            cache_capacity: DEFAULT_CAPACITY,
            excerpt_words: DEFAULT_EXCERPT_WORDS,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            default_author: DEFAULT_AUTHOR.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
            source_label: DEFAULT_SOURCE.to_string(),
            analytics_endpoint: None,
            analytics_token: None,
            allow_private_hosts: false,
        }
    }
}

/// SEC-015: Mask analytics_token in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("fallback_urls", &self.fallback_urls)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("user_agent", &self.user_agent)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_capacity", &self.cache_capacity)
            .field("excerpt_words", &self.excerpt_words)
            .field("words_per_minute", &self.words_per_minute)
            .field("default_author", &self.default_author)
            .field("default_category", &self.default_category)
            .field("source_label", &self.source_label)
            .field("analytics_endpoint", &self.analytics_endpoint)
            .field(
                "analytics_token",
                &self.analytics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allow_private_hosts", &self.allow_private_hosts)
            .finish()
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 16] = [
        "feed_url",
        "fallback_urls",
        "timeout_ms",
        "max_retries",
        "retry_delay_ms",
        "user_agent",
        "cache_ttl_secs",
        "cache_capacity",
        "excerpt_words",
        "words_per_minute",
        "default_author",
        "default_category",
        "source_label",
        "analytics_endpoint",
        "analytics_token",
        "allow_private_hosts",
    ];

    /// `~/.config/marketfeed/config.toml`, or `None` when HOME is unset.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("marketfeed")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), feed_url = %config.feed_url, "Loaded configuration");
        Ok(config)
    }

    pub fn host_policy(&self) -> HostPolicy {
        if self.allow_private_hosts {
            HostPolicy::AllowPrivate
        } else {
            HostPolicy::PublicOnly
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            user_agent: self.user_agent.clone(),
            max_body_bytes: MAX_FEED_SIZE,
            host_policy: self.host_policy(),
        }
    }

    pub fn normalizer_options(&self) -> NormalizerOptions {
        NormalizerOptions {
            default_author: self.default_author.clone(),
            default_category: self.default_category.clone(),
            source_label: self.source_label.clone(),
            excerpt_words: self.excerpt_words,
            words_per_minute: self.words_per_minute,
            ..NormalizerOptions::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Analytics token, preferring MARKETFEED_ANALYTICS_TOKEN over the file.
    pub fn analytics_token(&self) -> Option<SecretString> {
        std::env::var("MARKETFEED_ANALYTICS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.analytics_token.clone())
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================

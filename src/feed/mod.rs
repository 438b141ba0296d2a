//! Feed retrieval and normalization.
//!
//! - [`fetcher`] - HTTP retrieval with a per-attempt timeout and bounded retries
//! - [`parser`] - RSS 2.0 / Atom / RDF normalization into [`FeedDocument`]
//! - [`validate`] - the validation gate and a detailed inspection report
//!
//! # Example
//!
//! ```no_run
//! use marketfeed::feed::{FeedFetcher, FeedNormalizer, FetchOptions, FetcherConfig};
//!
//! # async fn run() -> Result<(), marketfeed::feed::FeedError> {
//! let fetcher = FeedFetcher::new(reqwest::Client::new(), FetcherConfig::default());
//! let xml = fetcher
//!     .fetch("https://www.simplifyingthemarket.com/en/feed", &FetchOptions::default())
//!     .await?;
//! let feed = FeedNormalizer::default().normalize(&xml, "https://www.simplifyingthemarket.com/en/feed")?;
//! println!("{} articles", feed.document.article_count);
//! # Ok(())
//! # }
//! ```

mod error;
mod fetcher;
mod parser;
mod types;
mod validate;
mod xml;

pub use error::{ErrorCode, ErrorReport, FeedError};
pub use fetcher::{
    backoff_delay, FeedFetcher, FetchOptions, FetcherConfig, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, MAX_FEED_SIZE,
};
pub use parser::{
    excerpt, parse_date, read_time, FeedNormalizer, NormalizerOptions, DEFAULT_AUTHOR,
    DEFAULT_CATEGORY, DEFAULT_DESCRIPTION, DEFAULT_EXCERPT_WORDS, DEFAULT_LANGUAGE,
    DEFAULT_SOURCE, DEFAULT_TITLE, DEFAULT_WORDS_PER_MINUTE,
};
pub use types::{
    Article, ArticleSummary, FeedDocument, FeedType, NormalizedFeed, ParseWarning,
};
pub use validate::{inspect_feed, validate_feed, ValidationReport};

//! Fetch, normalize and cache orchestration.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::analytics::{AnalyticsSink, PerformanceMetric};
use crate::feed::{
    validate_feed, Article, FeedDocument, FeedError, FeedFetcher, FeedNormalizer, FetchOptions,
    NormalizedFeed, ParseWarning,
};
use crate::storage::{CacheSlot, JsonCache, Lookup};

/// Number of articles in the "latest insights" selection
pub const INSIGHTS_LIMIT: usize = 3;

/// Where a [`LoadedFeed`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrigin {
    Network,
    Cache,
    /// Expired cache entry served because the refresh failed
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFeed {
    pub document: FeedDocument,
    pub origin: FeedOrigin,
    /// Entry-level warnings from normalization; empty for cached feeds
    pub warnings: Vec<ParseWarning>,
}

/// Cache key for a feed URL: `feed:` followed by the hex SHA-256 of the URL.
pub fn cache_key(url: &str) -> String {
    format!("feed:{:x}", Sha256::digest(url.as_bytes()))
}

fn insights_key(url: &str, limit: usize) -> String {
    format!("{}:{limit}:{}", CacheSlot::Insights.key(), cache_key(url))
}

/// Loads feeds through the cache.
///
/// A fresh cache entry is returned without touching the network. Otherwise
/// the feed is fetched, normalized and stored. When a refresh fails while an
/// expired copy is still held, that stale document is served instead of the
/// error.
pub struct FeedService {
    fetcher: FeedFetcher,
    normalizer: FeedNormalizer,
    cache: Arc<JsonCache>,
    analytics: Arc<dyn AnalyticsSink>,
    cache_ttl: Duration,
}

impl FeedService {
    pub fn new(
        fetcher: FeedFetcher,
        normalizer: FeedNormalizer,
        cache: Arc<JsonCache>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            fetcher,
            normalizer,
            cache,
            analytics,
            cache_ttl,
        }
    }

    /// TTL for feed documents; defaults to the cache's own default.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }

    pub fn analytics(&self) -> &dyn AnalyticsSink {
        self.analytics.as_ref()
    }

    pub async fn load(&self, url: &str) -> Result<LoadedFeed, FeedError> {
        let key = cache_key(url);

        let stale = match self.cache.lookup_as::<FeedDocument>(&key) {
            Lookup::Fresh(document) => {
                tracing::debug!(url = %url, "Feed served from cache");
                return Ok(LoadedFeed {
                    document,
                    origin: FeedOrigin::Cache,
                    warnings: Vec::new(),
                });
            }
            Lookup::Stale(document) => Some(document),
            Lookup::Miss => None,
        };

        match self.refresh(url).await {
            Ok(NormalizedFeed { document, warnings }) => {
                self.cache.put_as(&key, &document, Some(self.cache_ttl));
                Ok(LoadedFeed {
                    document,
                    origin: FeedOrigin::Network,
                    warnings,
                })
            }
            Err(e) => match stale {
                Some(document) => {
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        code = %e.code(),
                        "Feed refresh failed, serving stale copy"
                    );
                    Ok(LoadedFeed {
                        document,
                        origin: FeedOrigin::Stale,
                        warnings: Vec::new(),
                    })
                }
                None => Err(e),
            },
        }
    }

    /// Fetch and normalize `url`, bypassing the cache.
    pub async fn refresh(&self, url: &str) -> Result<NormalizedFeed, FeedError> {
        let started = Instant::now();
        let result = match self.fetcher.fetch(url, &FetchOptions::default()).await {
            Ok(xml) => self.normalizer.normalize(&xml, url),
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.code().as_str(),
        };
        self.analytics.record_metric(
            &PerformanceMetric::new("fetch_duration_ms", started.elapsed().as_millis() as f64)
                .with_context("url", url)
                .with_context("outcome", outcome),
        );

        match &result {
            Ok(feed) => tracing::info!(
                url = %url,
                articles = feed.document.article_count,
                warnings = feed.warnings.len(),
                "Feed refreshed"
            ),
            Err(e) => tracing::warn!(url = %url, error = %e, code = %e.code(), "Feed refresh failed"),
        }
        result
    }

    /// Try `primary`, then each alternate in order. Returns the first
    /// success, or the last error when every URL fails.
    pub async fn load_with_fallback(
        &self,
        primary: &str,
        alternates: &[String],
    ) -> Result<LoadedFeed, FeedError> {
        let mut last_error = match self.load(primary).await {
            Ok(feed) => return Ok(feed),
            Err(e) => e,
        };

        for url in alternates {
            tracing::info!(url = %url, previous_error = %last_error, "Trying alternate feed URL");
            match self.load(url).await {
                Ok(feed) => return Ok(feed),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// [`load`](Self::load) followed by the [`validate_feed`] gate.
    pub async fn load_validated(&self, url: &str) -> Result<LoadedFeed, FeedError> {
        let feed = self.load(url).await?;
        validate_feed(&feed.document)?;
        Ok(feed)
    }

    /// The newest `limit` articles, cached separately with the insights TTL.
    pub async fn insights(&self, url: &str, limit: usize) -> Result<Vec<Article>, FeedError> {
        let key = insights_key(url, limit);
        if let Some(articles) = self.cache.get_as::<Vec<Article>>(&key) {
            return Ok(articles);
        }

        let feed = self.load(url).await?;
        let articles: Vec<Article> = feed.document.articles.into_iter().take(limit).collect();
        self.cache
            .put_as(&key, &articles, Some(CacheSlot::Insights.ttl()));
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cache_key_is_hashed_url() {
        let key = cache_key("https://example.com/feed");
        assert!(key.starts_with("feed:"));
        assert_eq!(key.len(), "feed:".len() + 64);
        assert_eq!(key, cache_key("https://example.com/feed"));
        assert_ne!(key, cache_key("https://example.com/feed2"));
    }

    #[test]
    fn test_insights_key_includes_limit() {
        let url = "https://example.com/feed";
        assert_ne!(insights_key(url, 3), insights_key(url, 5));
        assert!(insights_key(url, 3).starts_with("market-insights:3:feed:"));
    }
}

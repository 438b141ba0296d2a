//! Integration tests for the cache lifecycle: write, expiry, sweep, typed access.
//!
//! Tests run on a paused tokio clock so expiry is exact and instant.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use marketfeed::feed::{FeedDocument, FeedNormalizer};
use marketfeed::storage::{CacheSlot, CacheStats, JsonCache, Lookup, TtlCache};
use pretty_assertions::assert_eq;

fn sample_document() -> FeedDocument {
    let xml = r#"<rss><channel><title>Cached</title>
        <item><title>One</title><pubDate>2025-02-01</pubDate></item>
        <item><title>Two</title><pubDate>2025-02-02</pubDate></item>
    </channel></rss>"#;
    FeedNormalizer::default()
        .normalize_at(
            xml,
            "https://feeds.example.com/kcm",
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
        .document
}

#[tokio::test(start_paused = true)]
async fn test_entry_with_100ms_ttl_misses_after_150ms() {
    let cache: TtlCache<FeedDocument> = TtlCache::default();
    let document = sample_document();

    cache.put("k", document.clone(), Some(Duration::from_millis(100)));
    assert_eq!(cache.get("k"), Some(document));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(cache.get("k"), None);
}

#[tokio::test(start_paused = true)]
async fn test_state_machine_absent_valid_expired_absent() {
    let cache: TtlCache<u32> = TtlCache::default();
    assert_eq!(cache.lookup("k"), Lookup::Miss);

    cache.put("k", 1, Some(Duration::from_secs(1)));
    assert_eq!(cache.lookup("k"), Lookup::Fresh(1));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(
        cache.stats(),
        CacheStats {
            total: 1,
            valid: 0,
            stale: 1
        }
    );
    assert_eq!(cache.lookup("k"), Lookup::Stale(1));
    assert_eq!(cache.lookup("k"), Lookup::Miss);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_named_slots_expire_independently() {
    let cache = JsonCache::default();
    let document = sample_document();

    cache.put_as(CacheSlot::Feed.key(), &document, Some(CacheSlot::Feed.ttl()));
    cache.put_as(
        CacheSlot::Articles.key(),
        &document.articles,
        Some(CacheSlot::Articles.ttl()),
    );
    cache.put_as(
        CacheSlot::Insights.key(),
        &document.articles[..1],
        Some(CacheSlot::Insights.ttl()),
    );

    tokio::time::advance(Duration::from_secs(31 * 60)).await;
    assert_eq!(cache.sweep(), 1);
    assert!(cache.contains(CacheSlot::Feed.key()));

    tokio::time::advance(Duration::from_secs(30 * 60)).await;
    assert_eq!(cache.sweep(), 1);
    assert_eq!(
        cache.get_as::<Vec<marketfeed::feed::Article>>(CacheSlot::Articles.key()),
        Some(document.articles.clone())
    );

    tokio::time::advance(Duration::from_secs(60 * 60)).await;
    assert_eq!(cache.sweep(), 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_json_round_trip_preserves_document() {
    let cache = JsonCache::default();
    let document = sample_document();
    cache.put_as("feed", &document, None);
    assert_eq!(cache.get_as::<FeedDocument>("feed"), Some(document));
}

#[tokio::test]
async fn test_clear_resets_everything() {
    let cache: TtlCache<String> = TtlCache::new(4, Duration::from_secs(60));
    for i in 0..4 {
        cache.put(&format!("k{i}"), i.to_string(), None);
    }
    assert_eq!(cache.len(), 4);
    cache.clear();
    assert_eq!(cache.stats(), CacheStats::default());
}

//! Property tests for the normalizer: ordering, idempotence, sanitization
//! and derived-field invariants over generated feeds.

use chrono::{Duration, TimeZone, Utc};
use marketfeed::feed::{FeedNormalizer, ParseWarning};
use proptest::prelude::*;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Debug, Clone)]
struct GenItem {
    title: String,
    /// Days after the base date; `None` writes an unparseable date
    day_offset: Option<i64>,
    body: String,
    inject_script: bool,
}

fn item_strategy() -> impl Strategy<Value = GenItem> {
    (
        "[A-Za-z][A-Za-z ]{0,30}",
        prop::option::weighted(0.9, 0i64..365),
        "[a-z ]{0,300}",
        any::<bool>(),
    )
        .prop_map(|(title, day_offset, body, inject_script)| GenItem {
            title,
            day_offset,
            body,
            inject_script,
        })
}

fn render_feed(items: &[GenItem]) -> String {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let mut xml = String::from("<rss version=\"2.0\"><channel><title>Generated</title>");
    for item in items {
        let date = match item.day_offset {
            Some(days) => (base + Duration::days(days)).to_rfc2822(),
            None => "not a date".to_string(),
        };
        let mut html = format!("<p>{}</p>", item.body);
        if item.inject_script {
            html.push_str("<script>steal(document.cookie)</script>");
        }
        xml.push_str(&format!(
            "<item><title>{}</title><pubDate>{}</pubDate><description>{}</description></item>",
            escape(&item.title),
            date,
            escape(&html)
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

proptest! {
    #[test]
    fn articles_sorted_newest_first(items in prop::collection::vec(item_strategy(), 0..20)) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let feed = FeedNormalizer::default()
            .normalize_at(&render_feed(&items), "https://feeds.example.com/gen", now)
            .unwrap();
        let articles = &feed.document.articles;
        prop_assert_eq!(articles.len(), items.len());
        prop_assert_eq!(feed.document.article_count, items.len());
        for pair in articles.windows(2) {
            prop_assert!(pair[0].published_at >= pair[1].published_at);
        }
    }

    #[test]
    fn normalization_is_idempotent(items in prop::collection::vec(item_strategy(), 0..10)) {
        let xml = render_feed(&items);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let normalizer = FeedNormalizer::default();
        let first = normalizer.normalize_at(&xml, "https://feeds.example.com/gen", now).unwrap();
        let second = normalizer.normalize_at(&xml, "https://feeds.example.com/gen", now).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn content_is_sanitized_and_read_time_positive(items in prop::collection::vec(item_strategy(), 1..10)) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let feed = FeedNormalizer::default()
            .normalize_at(&render_feed(&items), "https://feeds.example.com/gen", now)
            .unwrap();
        for article in &feed.document.articles {
            prop_assert!(!article.content.to_lowercase().contains("<script"));
            prop_assert!(!article.description.to_lowercase().contains("<script"));
            prop_assert!(!article.content.contains("steal"));
            prop_assert!(article.read_time >= 1);
            prop_assert!(!article.content.contains("  "));
        }
    }

    #[test]
    fn unparseable_dates_are_reported(items in prop::collection::vec(item_strategy(), 1..10)) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let feed = FeedNormalizer::default()
            .normalize_at(&render_feed(&items), "https://feeds.example.com/gen", now)
            .unwrap();
        let expected = items.iter().filter(|i| i.day_offset.is_none()).count();
        let reported = feed
            .warnings
            .iter()
            .filter(|w| matches!(w, ParseWarning::UnparseableDate { .. }))
            .count();
        prop_assert_eq!(reported, expected);
        let defaulted = feed.document.articles.iter().filter(|a| a.published_at == now).count();
        prop_assert_eq!(defaulted, expected);
    }
}

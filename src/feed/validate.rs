use serde::{Deserialize, Serialize};

use super::error::FeedError;
use super::types::FeedDocument;

/// Gate applied by callers that require a usable feed.
///
/// Rejects a document with an empty title or no articles, reporting every
/// failed check at once.
pub fn validate_feed(feed: &FeedDocument) -> Result<(), FeedError> {
    let mut errors = Vec::new();

    if feed.title.trim().is_empty() {
        errors.push("Missing feed title".to_string());
    }
    if feed.articles.is_empty() {
        errors.push("No articles found in feed".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(FeedError::Validation { errors })
    }
}

/// Detailed health report for a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub article_count: usize,
}

/// Inspect a feed without failing.
///
/// Unlike [`validate_feed`], an empty feed is only a warning here; articles
/// are checked one by one and numbered from 1.
pub fn inspect_feed(feed: &FeedDocument) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if feed.title.trim().is_empty() {
        errors.push("Feed title is missing".to_string());
    }
    if feed.articles.is_empty() {
        warnings.push("Feed contains no articles".to_string());
    }

    for (i, article) in feed.articles.iter().enumerate() {
        let n = i + 1;
        if article.title.trim().is_empty() {
            errors.push(format!("Article {n} is missing title"));
        }
        if article.link.trim().is_empty() {
            warnings.push(format!("Article {n} is missing link"));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        article_count: feed.articles.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ErrorCode, FeedNormalizer};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn doc(xml: &str) -> FeedDocument {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        FeedNormalizer::default()
            .normalize_at(xml, "https://feeds.example.com/kcm", now)
            .unwrap()
            .document
    }

    #[test]
    fn test_empty_feed_fails_gate() {
        let feed = doc("<rss><channel></channel></rss>");
        assert!(feed.articles.is_empty());
        assert_eq!(feed.article_count, 0);

        let err = validate_feed(&feed).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        match err {
            FeedError::Validation { errors } => {
                assert_eq!(errors, vec!["No articles found in feed".to_string()]);
            }
            e => panic!("Expected Validation, got {e:?}"),
        }
    }

    #[test]
    fn test_missing_title_and_articles_reported_together() {
        let mut feed = doc("<rss><channel></channel></rss>");
        feed.title = String::new();
        match validate_feed(&feed).unwrap_err() {
            FeedError::Validation { errors } => assert_eq!(
                errors,
                vec![
                    "Missing feed title".to_string(),
                    "No articles found in feed".to_string()
                ]
            ),
            e => panic!("Expected Validation, got {e:?}"),
        }
    }

    #[test]
    fn test_populated_feed_passes() {
        let feed = doc("<rss><channel><item><title>A</title></item></channel></rss>");
        assert!(validate_feed(&feed).is_ok());
    }

    #[test]
    fn test_inspect_reports_warnings() {
        let empty = inspect_feed(&doc("<rss><channel></channel></rss>"));
        assert!(empty.is_valid);
        assert_eq!(empty.warnings, vec!["Feed contains no articles".to_string()]);

        let feed = doc(
            "<rss><channel><item><title>A</title></item><item><title>B</title><link>b.example.com</link></item></channel></rss>",
        );
        let report = inspect_feed(&feed);
        assert_eq!(
            report,
            ValidationReport {
                is_valid: true,
                errors: vec![],
                warnings: vec!["Article 1 is missing link".to_string()],
                article_count: 2,
            }
        );
    }

    #[test]
    fn test_inspect_flags_untitled_article() {
        let mut feed = doc("<rss><channel><item><title>A</title><link>https://a.example</link></item></channel></rss>");
        feed.articles[0].title = "  ".to_string();
        let report = inspect_feed(&feed);
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec!["Article 1 is missing title".to_string()]);
    }
}

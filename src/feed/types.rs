use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Syndication dialect a document was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedType {
    #[serde(rename = "RSS")]
    Rss,
    #[serde(rename = "Atom")]
    Atom,
    #[serde(rename = "RDF")]
    Rdf,
}

impl std::fmt::Display for FeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FeedType::Rss => "RSS",
            FeedType::Atom => "Atom",
            FeedType::Rdf => "RDF",
        })
    }
}

/// One normalized feed entry.
///
/// Text fields are sanitized plain text. `published_at` is always a real
/// timestamp; entries whose date could not be read carry the time the feed
/// was normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub read_time: u32,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub source: String,
    pub original_url: String,
}

/// A fetched and normalized feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub link: String,
    pub language: String,
    pub last_build_date: DateTime<Utc>,
    /// Most recent first
    pub articles: Vec<Article>,
    pub last_updated: DateTime<Utc>,
    pub feed_type: FeedType,
    pub article_count: usize,
}

/// A recoverable problem with a single feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParseWarning {
    /// Entry had no usable title and was dropped.
    MissingTitle { index: usize },
    /// Entry date could not be parsed; the normalization time was used.
    UnparseableDate { index: usize, raw: String },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::MissingTitle { index } => {
                write!(f, "entry {index} has no title and was skipped")
            }
            ParseWarning::UnparseableDate { index, raw } => {
                write!(f, "entry {index} has unparseable date {raw:?}")
            }
        }
    }
}

/// Normalizer output: the document plus every entry-level warning.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeed {
    pub document: FeedDocument,
    pub warnings: Vec<ParseWarning>,
}

/// Lightweight article reference used by analytics events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub author: String,
    pub read_time: u32,
    pub source: String,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            category: article.category.clone(),
            author: article.author.clone(),
            read_time: article.read_time,
            source: article.source.clone(),
        }
    }
}

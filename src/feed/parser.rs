use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::error::FeedError;
use super::types::{Article, FeedDocument, FeedType, NormalizedFeed, ParseWarning};
use super::xml::{parse_document, Element, XmlError};
use crate::util::{clean_content, extract_image_url, sanitize_text, sanitize_url, word_count};

pub const DEFAULT_TITLE: &str = "Market Insights";
pub const DEFAULT_DESCRIPTION: &str = "Latest real estate market insights";
pub const DEFAULT_AUTHOR: &str = "KCM Team";
pub const DEFAULT_CATEGORY: &str = "Market Insights";
pub const DEFAULT_SOURCE: &str = "KCM";
pub const DEFAULT_LANGUAGE: &str = "en";
/// 150 characters at roughly five characters per word
pub const DEFAULT_EXCERPT_WORDS: usize = 30;
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Fallback values and derived-field parameters used while normalizing.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerOptions {
    pub default_title: String,
    pub default_description: String,
    pub default_author: String,
    pub default_category: String,
    pub default_language: String,
    pub source_label: String,
    pub excerpt_words: usize,
    pub words_per_minute: usize,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            default_description: DEFAULT_DESCRIPTION.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            source_label: DEFAULT_SOURCE.to_string(),
            excerpt_words: DEFAULT_EXCERPT_WORDS,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

/// The three document shapes a feed can take, resolved once up front.
#[derive(Debug, Clone, Copy)]
enum FeedShape<'a> {
    /// `<rss><channel>...<item/></channel></rss>`
    Rss { channel: &'a Element },
    /// `<feed>...<entry/></feed>`
    Atom { feed: &'a Element },
    /// `<rdf:RDF><channel/><item/></rdf:RDF>`; items are siblings of the channel
    Rdf {
        root: &'a Element,
        channel: Option<&'a Element>,
    },
}

/// Channel-level fields, still raw.
#[derive(Debug, Default)]
struct ChannelMeta {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    language: Option<String>,
    last_build_date: Option<String>,
}

impl<'a> FeedShape<'a> {
    fn classify(root: &'a Element) -> Result<Self, FeedError> {
        match root.local_name() {
            "rss" => root
                .child("channel")
                .map(|channel| FeedShape::Rss { channel })
                .ok_or_else(|| {
                    FeedError::InvalidStructure("missing channel element".to_string())
                }),
            "feed" => Ok(FeedShape::Atom { feed: root }),
            "RDF" => Ok(FeedShape::Rdf {
                root,
                channel: root.child("channel"),
            }),
            other => Err(FeedError::InvalidStructure(format!(
                "missing channel or feed element (root is <{other}>)"
            ))),
        }
    }

    fn feed_type(&self) -> FeedType {
        match self {
            FeedShape::Rss { .. } => FeedType::Rss,
            FeedShape::Atom { .. } => FeedType::Atom,
            FeedShape::Rdf { .. } => FeedType::Rdf,
        }
    }

    fn items(&self) -> Vec<&'a Element> {
        match *self {
            FeedShape::Rss { channel } => channel.children_named("item").collect(),
            FeedShape::Atom { feed } => feed.children_named("entry").collect(),
            FeedShape::Rdf { root, channel } => root
                .children_named("item")
                .chain(channel.into_iter().flat_map(|c| c.children_named("item")))
                .collect(),
        }
    }

    fn metadata(&self) -> ChannelMeta {
        match *self {
            FeedShape::Rss { channel } => ChannelMeta {
                title: channel.child_text("title"),
                description: channel.child_text("description"),
                link: channel.child_text("link"),
                language: channel.child_text("language"),
                last_build_date: channel.first_child_text(&["lastBuildDate", "pubDate"]),
            },
            FeedShape::Atom { feed } => ChannelMeta {
                title: feed.child_text("title"),
                description: feed.first_child_text(&["subtitle", "description"]),
                link: atom_link(feed),
                language: feed
                    .attr("xml:lang")
                    .map(str::to_string)
                    .or_else(|| feed.child_text("language")),
                last_build_date: feed.child_text("updated"),
            },
            FeedShape::Rdf { channel, .. } => channel
                .map(|c| ChannelMeta {
                    title: c.child_text("title"),
                    description: c.child_text("description"),
                    link: c.child_text("link"),
                    language: c.first_child_text(&["dc:language", "language"]),
                    last_build_date: c.first_child_text(&["dc:date", "lastBuildDate"]),
                })
                .unwrap_or_default(),
        }
    }
}

/// Converts raw RSS 2.0, Atom or RDF XML into a [`FeedDocument`].
///
/// Normalization is permissive: entries without a title are dropped and
/// unreadable dates fall back to the normalization time, both reported as
/// [`ParseWarning`]s. Only a document that cannot be read or has no
/// recognizable shape is an error.
#[derive(Debug, Clone, Default)]
pub struct FeedNormalizer {
    options: NormalizerOptions,
}

impl FeedNormalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizerOptions {
        &self.options
    }

    /// Normalize `xml` fetched from `feed_url`, stamping it with the current time.
    pub fn normalize(&self, xml: &str, feed_url: &str) -> Result<NormalizedFeed, FeedError> {
        self.normalize_at(xml, feed_url, Utc::now())
    }

    /// Normalize with an explicit clock. `now` is used for `lastUpdated` and
    /// for every date that cannot be parsed, so equal inputs give equal output.
    pub fn normalize_at(
        &self,
        xml: &str,
        feed_url: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedFeed, FeedError> {
        let root = parse_document(xml).map_err(|e| match e {
            XmlError::Syntax { .. } => FeedError::Parse {
                message: e.to_string(),
                retries: 0,
                cause: None,
            },
            XmlError::TooDeep(_) => FeedError::Processing(e.to_string()),
            XmlError::NoRoot => FeedError::InvalidStructure(e.to_string()),
        })?;

        let shape = FeedShape::classify(&root)?;
        let mut warnings = Vec::new();
        let mut articles = Vec::new();

        for (index, item) in shape.items().into_iter().enumerate() {
            match self.build_article(item, index, articles.len(), now, &mut warnings) {
                Ok(article) => articles.push(article),
                Err(warning) => {
                    tracing::warn!(feed = %feed_url, %warning, "Dropping feed entry");
                    warnings.push(warning);
                }
            }
        }

        if articles.is_empty() {
            tracing::warn!(feed = %feed_url, "Feed contains no articles");
        }

        // Stable: entries sharing a timestamp keep their feed order
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let meta = shape.metadata();
        let opts = &self.options;

        let document = FeedDocument {
            title: non_empty(meta.title.as_deref().map(sanitize_text))
                .unwrap_or_else(|| opts.default_title.clone()),
            description: non_empty(meta.description.as_deref().map(sanitize_text))
                .unwrap_or_else(|| opts.default_description.clone()),
            link: non_empty(meta.link.as_deref().map(sanitize_url))
                .unwrap_or_else(|| feed_url.to_string()),
            language: non_empty(meta.language.map(|l| l.trim().to_string()))
                .unwrap_or_else(|| opts.default_language.clone()),
            last_build_date: meta
                .last_build_date
                .as_deref()
                .and_then(parse_date)
                .unwrap_or(now),
            article_count: articles.len(),
            articles,
            last_updated: now,
            feed_type: shape.feed_type(),
        };

        tracing::debug!(
            feed = %feed_url,
            feed_type = %document.feed_type,
            articles = document.article_count,
            warnings = warnings.len(),
            "Normalized feed"
        );

        Ok(NormalizedFeed { document, warnings })
    }

    /// Build one article. `index` is the entry's position in the document,
    /// `position` its position among entries kept so far.
    fn build_article(
        &self,
        item: &Element,
        index: usize,
        position: usize,
        now: DateTime<Utc>,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<Article, ParseWarning> {
        let opts = &self.options;

        let title = item
            .child_text("title")
            .map(|t| sanitize_text(&t))
            .filter(|t| !t.is_empty())
            .ok_or(ParseWarning::MissingTitle { index })?;

        let raw_description = item
            .first_child_text(&["description", "summary"])
            .unwrap_or_default();
        let raw_content = item
            .first_child_text(&["content:encoded", "content"])
            .unwrap_or_else(|| raw_description.clone());

        let content = clean_content(&raw_content);
        let image_url = extract_image_url(&raw_content);
        let excerpt = excerpt(&content, opts.excerpt_words);
        let read_time = read_time(&content, opts.words_per_minute);

        let raw_date = item.first_child_text(&["pubDate", "published", "updated", "dc:date"]);
        let published_at = match raw_date.as_deref().and_then(parse_date) {
            Some(date) => date,
            None => {
                warnings.push(ParseWarning::UnparseableDate {
                    index,
                    raw: raw_date.unwrap_or_default(),
                });
                now
            }
        };

        let id = item
            .first_child_text(&["guid", "id"])
            .or_else(|| item.attr("rdf:about").map(str::to_string))
            .unwrap_or_else(|| format!("article-{position}"));

        let link = sanitize_url(&item_link(item).unwrap_or_default());

        let categories = categories(item);
        let category = categories
            .first()
            .cloned()
            .unwrap_or_else(|| opts.default_category.clone());
        let tags = tags(item, &categories);

        let author = non_empty(item_author(item).map(|a| sanitize_text(&a)))
            .unwrap_or_else(|| opts.default_author.clone());

        Ok(Article {
            id,
            title,
            description: clean_content(&raw_description),
            content,
            original_url: link.clone(),
            link,
            published_at,
            author,
            category,
            image_url,
            read_time,
            excerpt,
            tags,
            source: opts.source_label.clone(),
        })
    }
}

/// Best-effort publication date parse.
///
/// Accepts RFC 2822 (RSS), RFC 3339 (Atom, Dublin Core) and bare
/// `YYYY-MM-DD[ HH:MM:SS]` forms, the latter assumed to be UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// First `max_words` words of `content`, with "..." appended when cut.
pub fn excerpt(content: &str, max_words: usize) -> String {
    if word_count(content) <= max_words {
        return content.to_string();
    }
    let head: Vec<&str> = content.split_whitespace().take(max_words).collect();
    format!("{}...", head.join(" "))
}

/// Estimated minutes to read `content`; never less than one.
pub fn read_time(content: &str, words_per_minute: usize) -> u32 {
    let wpm = words_per_minute.max(1);
    let minutes = word_count(content).div_ceil(wpm).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Atom `<link href>` preferring `rel="alternate"` or no rel at all.
fn atom_link(element: &Element) -> Option<String> {
    let links: Vec<&Element> = element.children_named("link").collect();
    links
        .iter()
        .find(|l| matches!(l.attr("rel"), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|l| l.attr("href"))
        .map(str::to_string)
}

fn item_link(item: &Element) -> Option<String> {
    atom_link(item)
        .filter(|href| !href.trim().is_empty())
        .or_else(|| item.child_text("link"))
}

fn item_author(item: &Element) -> Option<String> {
    item.child("author")
        .and_then(|author| author.child_text("name").or_else(|| Some(author.text_content())))
        .filter(|a| !a.trim().is_empty())
        .or_else(|| item.child_text("dc:creator"))
}

fn categories(item: &Element) -> Vec<String> {
    item.children_named("category")
        .filter_map(|c| {
            let raw = c
                .attr("term")
                .map(str::to_string)
                .unwrap_or_else(|| c.text_content());
            let clean = sanitize_text(&raw);
            (!clean.is_empty()).then_some(clean)
        })
        .collect()
}

fn tags(item: &Element, categories: &[String]) -> Vec<String> {
    let extra = item
        .child_text("tags")
        .map(|raw| {
            raw.split(',')
                .map(sanitize_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut tags: Vec<String> = Vec::with_capacity(categories.len() + extra.len());
    for tag in categories.iter().cloned().chain(extra) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn normalize(xml: &str) -> NormalizedFeed {
        FeedNormalizer::default()
            .normalize_at(xml, "https://feeds.example.com/kcm", now())
            .unwrap()
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
  <title>Simplifying The Market</title>
  <description>Weekly &amp; monthly updates</description>
  <link>www.simplifyingthemarket.com</link>
  <language>en-US</language>
  <lastBuildDate>Fri, 28 Feb 2025 10:00:00 GMT</lastBuildDate>
  <item>
    <title>Older Post</title>
    <link>https://www.simplifyingthemarket.com/en/older</link>
    <guid isPermaLink="false">stm-1</guid>
    <pubDate>Mon, 10 Feb 2025 09:00:00 +0000</pubDate>
    <dc:creator>Jane Doe</dc:creator>
    <category>Buying</category>
    <category>Rates</category>
    <description><![CDATA[<p>Short teaser</p>]]></description>
    <content:encoded><![CDATA[<p><img src="https://files.example.com/hero.jpg" /> Mortgage rates <b>eased</b>.</p><script>track()</script>]]></content:encoded>
  </item>
  <item>
    <title>Newer Post</title>
    <link>https://www.simplifyingthemarket.com/en/newer</link>
    <pubDate>Tue, 25 Feb 2025 09:00:00 +0000</pubDate>
    <description>&lt;p&gt;Inventory is &lt;em&gt;up&lt;/em&gt;&lt;/p&gt;</description>
  </item>
</channel>
</rss>"#;

    #[test]
    fn test_rss_channel_fields() {
        let doc = normalize(RSS).document;
        assert_eq!(doc.feed_type, FeedType::Rss);
        assert_eq!(doc.title, "Simplifying The Market");
        assert_eq!(doc.description, "Weekly & monthly updates");
        assert_eq!(doc.link, "https://www.simplifyingthemarket.com");
        assert_eq!(doc.language, "en-US");
        assert_eq!(
            doc.last_build_date,
            Utc.with_ymd_and_hms(2025, 2, 28, 10, 0, 0).unwrap()
        );
        assert_eq!(doc.last_updated, now());
        assert_eq!(doc.article_count, 2);
    }

    #[test]
    fn test_rss_articles_sorted_newest_first() {
        let doc = normalize(RSS).document;
        let titles: Vec<&str> = doc.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer Post", "Older Post"]);
    }

    #[test]
    fn test_rss_article_fields() {
        let doc = normalize(RSS).document;
        let older = &doc.articles[1];
        assert_eq!(older.id, "stm-1");
        assert_eq!(older.author, "Jane Doe");
        assert_eq!(older.category, "Buying");
        assert_eq!(older.tags, vec!["Buying".to_string(), "Rates".to_string()]);
        assert_eq!(older.content, "Mortgage rates eased .");
        assert_eq!(older.description, "Short teaser");
        assert_eq!(
            older.image_url.as_deref(),
            Some("https://files.example.com/hero.jpg")
        );
        assert_eq!(older.read_time, 1);
        assert_eq!(older.source, "KCM");
        assert_eq!(older.link, older.original_url);

        let newer = &doc.articles[0];
        // No guid: positional placeholder among kept entries
        assert_eq!(newer.id, "article-1");
        assert_eq!(newer.content, "Inventory is up");
        assert_eq!(newer.author, "KCM Team");
        assert_eq!(newer.category, "Market Insights");
        assert!(newer.tags.is_empty());
        assert!(newer.image_url.is_none());
    }

    #[test]
    fn test_invalid_date_example() {
        let xml = r#"<rss><channel><item><title>Test</title><description>&lt;p&gt;Hello &amp; welcome&lt;/p&gt;</description><pubDate>invalid-date</pubDate></item></channel></rss>"#;
        let result = normalize(xml);
        assert_eq!(result.document.articles.len(), 1);
        let article = &result.document.articles[0];
        assert_eq!(article.title, "Test");
        assert_eq!(article.content, "Hello & welcome");
        assert!(!article.content.contains('<'));
        assert_eq!(article.published_at, now());
        assert_eq!(article.read_time, 1);
        assert_eq!(
            result.warnings,
            vec![ParseWarning::UnparseableDate {
                index: 0,
                raw: "invalid-date".to_string()
            }]
        );
    }

    #[test]
    fn test_single_item_and_untitled_entries() {
        let xml = r#"<rss><channel>
            <item><description>no title here</description></item>
            <item><title>  </title></item>
            <item><title>Only one</title><pubDate>2025-01-05</pubDate></item>
        </channel></rss>"#;
        let result = normalize(xml);
        assert_eq!(result.document.article_count, 1);
        assert_eq!(result.document.articles[0].id, "article-0");
        assert_eq!(
            result.warnings,
            vec![
                ParseWarning::MissingTitle { index: 0 },
                ParseWarning::MissingTitle { index: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_channel_uses_defaults() {
        let result = normalize("<rss version=\"2.0\"><channel></channel></rss>");
        let doc = result.document;
        assert!(doc.articles.is_empty());
        assert_eq!(doc.article_count, 0);
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.description, DEFAULT_DESCRIPTION);
        assert_eq!(doc.link, "https://feeds.example.com/kcm");
        assert_eq!(doc.language, "en");
        assert_eq!(doc.last_build_date, now());
    }

    #[test]
    fn test_atom_feed() {
        let xml = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-GB">
  <title type="text">Atom Insights</title>
  <subtitle>Market notes</subtitle>
  <link rel="self" href="https://example.com/atom.xml"/>
  <link rel="alternate" href="https://example.com/"/>
  <updated>2025-02-20T08:00:00Z</updated>
  <entry>
    <title>Entry One</title>
    <id>urn:uuid:1</id>
    <link href="https://example.com/one"/>
    <published>2025-02-19T08:00:00+02:00</published>
    <author><name>Sam Lee</name><email>sam@example.com</email></author>
    <category term="Selling"/>
    <summary>Summary text</summary>
    <content type="html">&lt;p&gt;Full &lt;strong&gt;body&lt;/strong&gt;&lt;/p&gt;</content>
  </entry>
</feed>"#;
        let doc = normalize(xml).document;
        assert_eq!(doc.feed_type, FeedType::Atom);
        assert_eq!(doc.title, "Atom Insights");
        assert_eq!(doc.description, "Market notes");
        assert_eq!(doc.link, "https://example.com/");
        assert_eq!(doc.language, "en-GB");

        let entry = &doc.articles[0];
        assert_eq!(entry.id, "urn:uuid:1");
        assert_eq!(entry.link, "https://example.com/one");
        assert_eq!(entry.author, "Sam Lee");
        assert_eq!(entry.category, "Selling");
        assert_eq!(entry.content, "Full body");
        assert_eq!(entry.description, "Summary text");
        assert_eq!(
            entry.published_at,
            Utc.with_ymd_and_hms(2025, 2, 19, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rdf_feed() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="https://example.com/">
    <title>RDF Channel</title>
    <link>https://example.com/</link>
    <dc:language>fr</dc:language>
  </channel>
  <item rdf:about="https://example.com/a">
    <title>RDF Item</title>
    <link>https://example.com/a</link>
    <dc:date>2025-02-01T00:00:00Z</dc:date>
  </item>
</rdf:RDF>"#;
        let doc = normalize(xml).document;
        assert_eq!(doc.feed_type, FeedType::Rdf);
        assert_eq!(doc.title, "RDF Channel");
        assert_eq!(doc.language, "fr");
        assert_eq!(doc.articles.len(), 1);
        assert_eq!(doc.articles[0].id, "https://example.com/a");
        assert_eq!(doc.articles[0].content, "");
        assert_eq!(doc.articles[0].read_time, 1);
    }

    #[test]
    fn test_unrecognized_root_is_invalid_structure() {
        let err = FeedNormalizer::default()
            .normalize_at("<html><body/></html>", "https://x.example", now())
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidStructure(_)));
    }

    #[test]
    fn test_rss_without_channel_is_invalid_structure() {
        let err = FeedNormalizer::default()
            .normalize_at("<rss version=\"2.0\"/>", "https://x.example", now())
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidStructure(_)));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = FeedNormalizer::default()
            .normalize_at("<rss><channel></rss>", "https://x.example", now())
            .unwrap_err();
        assert!(matches!(err, FeedError::Parse { retries: 0, .. }));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let first = normalize(RSS);
        let second = normalize(RSS);
        assert_eq!(first, second);
    }

    #[test]
    fn test_character_references_decode_the_same_in_every_title() {
        let xml = r#"<rss><channel>
            <item><title>Buyer&#8217;s&nbsp;Guide</title></item>
            <item><title>Seller&#8217;s Guide</title></item>
        </channel></rss>"#;
        let titles: Vec<String> = normalize(xml)
            .document
            .articles
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Buyer\u{2019}s Guide", "Seller\u{2019}s Guide"]);
    }

    #[test]
    fn test_tags_element_is_split() {
        let xml = r#"<rss><channel><item><title>T</title><category>Rates</category><tags>Rates, Spring ,, Buyers</tags></item></channel></rss>"#;
        let doc = normalize(xml).document;
        assert_eq!(
            doc.articles[0].tags,
            vec!["Rates".to_string(), "Spring".to_string(), "Buyers".to_string()]
        );
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_date("Thu, 02 Jan 2025 03:04:05 GMT"), Some(expected));
        assert_eq!(parse_date("2025-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_date("2025-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(parse_date("2025-01-02 03:04:05"), Some(expected));
        assert_eq!(
            parse_date("2025-01-02"),
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("invalid-date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("a b c", 3), "a b c");
        assert_eq!(excerpt("a b c d", 3), "a b c...");
        assert_eq!(excerpt("", 3), "");
    }

    #[test]
    fn test_read_time() {
        assert_eq!(read_time("", 200), 1);
        assert_eq!(read_time(&"word ".repeat(200), 200), 1);
        assert_eq!(read_time(&"word ".repeat(201), 200), 2);
        assert_eq!(read_time(&"word ".repeat(1000), 200), 5);
    }
}

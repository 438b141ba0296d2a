use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use marketfeed::analytics::{AnalyticsSink, HttpSink, TracingSink};
use marketfeed::config::Config;
use marketfeed::feed::{inspect_feed, validate_feed, Article, FeedError, FeedFetcher, FeedNormalizer};
use marketfeed::service::{FeedService, LoadedFeed, INSIGHTS_LIMIT};
use marketfeed::storage::JsonCache;
use marketfeed::util::{format_read_time, format_relative_date, truncate_to_width};

/// Column budget for article titles in list output
const TITLE_WIDTH: usize = 72;

#[derive(Parser, Debug)]
#[command(
    name = "marketfeed",
    about = "Fetch, normalize and cache real estate market insight feeds"
)]
struct Args {
    /// Config file (default: ~/.config/marketfeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a feed and print its articles
    Fetch {
        /// Feed URL (default: configured feed, then its fallbacks)
        url: Option<String>,
        /// Fail unless the feed has a title and at least one article
        #[arg(long)]
        validate: bool,
        #[arg(long, value_enum, default_value_t = Format::List)]
        format: Format,
    },
    /// Poll a feed through the cache at a fixed interval
    Watch {
        url: Option<String>,
        /// Seconds between polls
        #[arg(long, default_value_t = 300)]
        interval: u64,
        /// Stop after this many polls
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Print a validation report for a feed
    Validate { url: Option<String> },
    /// Print the newest few articles
    Insights {
        url: Option<String>,
        #[arg(long, default_value_t = INSIGHTS_LIMIT)]
        limit: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path().context("HOME environment variable not set")?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::debug!(?config, "Effective configuration");

    let service = build_service(&config)?;

    let outcome = match args.command {
        Command::Fetch {
            url,
            validate,
            format,
        } => fetch(&service, &config, url.as_deref(), validate, format).await,
        Command::Watch {
            url,
            interval,
            iterations,
        } => {
            watch(&service, &config, url.as_deref(), interval, iterations).await;
            Ok(())
        }
        Command::Validate { url } => validate(&service, &config, url.as_deref()).await,
        Command::Insights { url, limit } => {
            let url = url.unwrap_or_else(|| config.feed_url.clone());
            service.insights(&url, limit).await.map(|articles| {
                print_articles(&articles);
            })
        }
    };

    if let Err(e) = outcome {
        exit_with_report(&e);
    }
    Ok(())
}

fn build_service(config: &Config) -> Result<FeedService> {
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let analytics: Arc<dyn AnalyticsSink> = match &config.analytics_endpoint {
        Some(endpoint) => {
            let endpoint = url::Url::parse(endpoint)
                .with_context(|| format!("Invalid analytics_endpoint '{endpoint}'"))?;
            Arc::new(HttpSink::new(
                client.clone(),
                endpoint,
                config.analytics_token(),
            ))
        }
        None => Arc::new(TracingSink),
    };

    let cache = Arc::new(JsonCache::new(config.cache_capacity, config.cache_ttl()));

    Ok(FeedService::new(
        FeedFetcher::new(client, config.fetcher_config()),
        FeedNormalizer::new(config.normalizer_options()),
        cache,
        analytics,
    )
    .with_cache_ttl(config.cache_ttl()))
}

/// Load an explicit URL, or the configured feed with its fallbacks.
async fn load(
    service: &FeedService,
    config: &Config,
    url: Option<&str>,
) -> Result<LoadedFeed, FeedError> {
    match url {
        Some(url) => service.load(url).await,
        None => {
            service
                .load_with_fallback(&config.feed_url, &config.fallback_urls)
                .await
        }
    }
}

async fn fetch(
    service: &FeedService,
    config: &Config,
    url: Option<&str>,
    validate: bool,
    format: Format,
) -> Result<(), FeedError> {
    let feed = load(service, config, url).await?;
    if validate {
        validate_feed(&feed.document)?;
    }

    for warning in &feed.warnings {
        eprintln!("warning: {warning}");
    }

    match format {
        Format::Json => match serde_json::to_string_pretty(&feed.document) {
            Ok(json) => println!("{json}"),
            Err(e) => return Err(FeedError::Processing(e.to_string())),
        },
        Format::List => {
            println!(
                "{} ({} articles, {})",
                feed.document.title, feed.document.article_count, feed.document.feed_type
            );
            print_articles(&feed.document.articles);
        }
    }
    Ok(())
}

async fn watch(
    service: &FeedService,
    config: &Config,
    url: Option<&str>,
    interval: u64,
    iterations: Option<u64>,
) {
    let mut poll = 0u64;
    loop {
        poll += 1;
        match load(service, config, url).await {
            Ok(feed) => println!(
                "[{}] {:?}: {} articles, newest: {}",
                Utc::now().format("%H:%M:%S"),
                feed.origin,
                feed.document.article_count,
                feed.document
                    .articles
                    .first()
                    .map(|a| a.title.as_str())
                    .unwrap_or("-")
            ),
            Err(e) => eprintln!(
                "[{}] {}: {e}",
                Utc::now().format("%H:%M:%S"),
                e.code()
            ),
        }

        let swept = service.cache().sweep();
        if swept > 0 {
            tracing::debug!(swept, "Removed expired cache entries");
        }

        if iterations.is_some_and(|n| poll >= n) {
            break;
        }
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }

    let stats = service.cache().stats();
    tracing::info!(
        polls = poll,
        total = stats.total,
        valid = stats.valid,
        stale = stats.stale,
        "Watch finished"
    );
}

async fn validate(service: &FeedService, config: &Config, url: Option<&str>) -> Result<(), FeedError> {
    let feed = load(service, config, url).await?;
    let report = inspect_feed(&feed.document);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => return Err(FeedError::Processing(e.to_string())),
    }
    if !report.is_valid {
        std::process::exit(1);
    }
    Ok(())
}

fn print_articles(articles: &[Article]) {
    let now = Utc::now();
    for article in articles {
        println!(
            "  {:<14} {}  [{}]",
            format_relative_date(article.published_at, now),
            truncate_to_width(&article.title, TITLE_WIDTH),
            format_read_time(article.read_time)
        );
    }
}

/// Print the error report as JSON on stderr and exit non-zero.
fn exit_with_report(error: &FeedError) -> ! {
    match serde_json::to_string_pretty(&error.report()) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("Error: {error}"),
    }
    std::process::exit(1);
}

//! Article engagement and performance reporting.
//!
//! The feed pipeline reports through an [`AnalyticsSink`]. Sinks are
//! fire-and-forget: a failing sink logs and never affects the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::feed::{Article, ArticleSummary};

/// Reader interaction with an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsAction {
    View,
    Click,
    Share,
}

impl std::fmt::Display for AnalyticsAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AnalyticsAction::View => "view",
            AnalyticsAction::Click => "click",
            AnalyticsAction::Share => "share",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub action: AnalyticsAction,
    pub article: ArticleSummary,
    /// Free-form caller data, e.g. the widget variant or list position
    pub context: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(action: AnalyticsAction, article: &Article) -> Self {
        Self {
            action,
            article: ArticleSummary::from(article),
            context: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// A named timing or size measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    pub name: String,
    pub value: f64,
    pub context: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl PerformanceMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            context: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Destination for analytics events and performance metrics.
///
/// The service records fetch metrics itself; article events are fired by
/// library consumers (page views, clicks, shares) through [`AnalyticsSink::track`].
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &AnalyticsEvent);

    fn record_metric(&self, metric: &PerformanceMetric);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn track(&self, _event: &AnalyticsEvent) {}

    fn record_metric(&self, _metric: &PerformanceMetric) {}
}

/// Writes events and metrics to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn track(&self, event: &AnalyticsEvent) {
        tracing::info!(
            action = %event.action,
            article_id = %event.article.id,
            title = %event.article.title,
            category = %event.article.category,
            "Article event"
        );
    }

    fn record_metric(&self, metric: &PerformanceMetric) {
        tracing::info!(metric = %metric.name, value = metric.value, "Performance metric");
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Payload<'a> {
    Event(&'a AnalyticsEvent),
    Metric(&'a PerformanceMetric),
}

/// POSTs JSON payloads to a collector endpoint.
///
/// Each report is sent on its own spawned task. The bearer token is only
/// attached over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<Arc<SecretString>>,
}

impl HttpSink {
    pub fn new(client: reqwest::Client, endpoint: Url, token: Option<SecretString>) -> Self {
        if token.is_some() && endpoint.scheme() != "https" {
            tracing::warn!(endpoint = %endpoint, "Analytics token will not be sent over plain HTTP");
        }
        Self {
            client,
            endpoint,
            token: token.map(Arc::new),
        }
    }

    pub async fn send_event(&self, event: &AnalyticsEvent) -> Result<(), reqwest::Error> {
        self.post(&Payload::Event(event)).await
    }

    pub async fn send_metric(&self, metric: &PerformanceMetric) -> Result<(), reqwest::Error> {
        self.post(&Payload::Metric(metric)).await
    }

    async fn post(&self, payload: &Payload<'_>) -> Result<(), reqwest::Error> {
        let mut request = self.client.post(self.endpoint.clone()).json(payload);
        if let Some(token) = &self.token {
            if self.endpoint.scheme() == "https" {
                request = request.bearer_auth(token.expose_secret());
            }
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }

    fn spawn_report<F>(&self, kind: &'static str, report: F)
    where
        F: std::future::Future<Output = Result<(), reqwest::Error>> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let endpoint = self.endpoint.clone();
                handle.spawn(async move {
                    if let Err(e) = report.await {
                        tracing::debug!(endpoint = %endpoint, kind, error = %e, "Analytics report failed");
                    }
                });
            }
            Err(_) => tracing::debug!(kind, "No async runtime, analytics report dropped"),
        }
    }
}

impl AnalyticsSink for HttpSink {
    fn track(&self, event: &AnalyticsEvent) {
        let sink = self.clone();
        let event = event.clone();
        self.spawn_report("event", async move { sink.send_event(&event).await });
    }

    fn record_metric(&self, metric: &PerformanceMetric) {
        let sink = self.clone();
        let metric = metric.clone();
        self.spawn_report("metric", async move { sink.send_metric(&metric).await });
    }
}

//! Attention summaries: trailing-window aggregation against the live tracker.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate;
use super::client::{ActivityClient, EventQuery, EventSort};
use crate::error::{CoreError, Result};

/// Bucket id prefix of the window watcher stream.
pub const DEFAULT_BUCKET_PREFIX: &str = "aw-watcher-window";

const DEFAULT_EVENT_LIMIT: u32 = 5_000;

/// Per-window attention totals. Built fresh each aggregation cycle and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionSummary {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Accumulated active milliseconds per `"title - app"` key.
    pub totals_by_key: HashMap<String, u64>,
}

impl AttentionSummary {
    /// Entries sorted by total descending, key ascending on ties.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        aggregate::ranked(&self.totals_by_key)
    }
}

/// Producer of [`AttentionSummary`] values from the tracker.
///
/// `poll` is designed to be called on a fixed cadence, but the cadence
/// itself (and any retry policy) belongs to the caller.
pub struct SummarySource {
    client: ActivityClient,
    bucket_prefix: String,
    bucket_override: Option<String>,
    event_limit: u32,
}

impl SummarySource {
    pub fn new(client: ActivityClient) -> Self {
        Self {
            client,
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            bucket_override: None,
            event_limit: DEFAULT_EVENT_LIMIT,
        }
    }

    pub fn with_bucket_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bucket_prefix = prefix.into();
        self
    }

    /// Pin a bucket id explicitly, skipping prefix discovery.
    pub fn with_bucket(mut self, bucket_id: impl Into<String>) -> Self {
        self.bucket_override = Some(bucket_id.into());
        self
    }

    pub fn with_event_limit(mut self, limit: u32) -> Self {
        self.event_limit = limit;
        self
    }

    /// Aggregate window activity over the trailing `past_ms` milliseconds.
    ///
    /// The bucket is re-resolved on every call so a tracker restart between
    /// polls does not wedge the source.
    pub async fn poll(&self, past_ms: i64) -> Result<AttentionSummary> {
        if past_ms <= 0 {
            return Err(CoreError::InvalidDuration(past_ms));
        }
        let bucket = self.resolve_bucket().await?;

        let window_end = Utc::now();
        let window_start = window_end - Duration::milliseconds(past_ms);
        let events = self
            .client
            .events(
                &bucket,
                &EventQuery {
                    start: Some(window_start),
                    end: Some(window_end),
                    limit: Some(self.event_limit),
                    offset: None,
                    sort: Some(EventSort::Asc),
                },
            )
            .await?;

        Ok(AttentionSummary {
            window_start,
            window_end,
            totals_by_key: aggregate::aggregate(&events, window_start, window_end),
        })
    }

    async fn resolve_bucket(&self) -> Result<String> {
        if let Some(id) = &self.bucket_override {
            return Ok(id.clone());
        }
        let buckets = self.client.list_buckets().await?;
        buckets
            .into_iter()
            .find(|b| b.starts_with(&self.bucket_prefix))
            .ok_or_else(|| CoreError::SourceUnavailable {
                prefix: self.bucket_prefix.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets_body() -> &'static str {
        r#"{"aw-watcher-afk_host": {}, "aw-watcher-window_host": {}}"#
    }

    #[tokio::test]
    async fn poll_rejects_non_positive_window() {
        let source = SummarySource::new(ActivityClient::new("http://127.0.0.1:1"));
        match source.poll(0).await {
            Err(CoreError::InvalidDuration(0)) => {}
            other => panic!("expected InvalidDuration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_fails_when_no_bucket_matches_prefix() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/0/buckets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"aw-watcher-afk_host": {}}"#)
            .create_async()
            .await;

        let source = SummarySource::new(ActivityClient::new(server.url()));
        match source.poll(60_000).await {
            Err(CoreError::SourceUnavailable { prefix }) => {
                assert_eq!(prefix, DEFAULT_BUCKET_PREFIX);
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_aggregates_events_from_the_discovered_bucket() {
        let mut server = mockito::Server::new_async().await;
        let _buckets = server
            .mock("GET", "/api/0/buckets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(buckets_body())
            .create_async()
            .await;

        // An event that started 30s ago and ran for 10s sits fully inside
        // any recent trailing window.
        let ts = (Utc::now() - Duration::seconds(30)).to_rfc3339();
        let body = format!(
            r#"[{{"timestamp": "{ts}", "duration": 10.0,
                 "data": {{"app": "firefox", "title": "Docs"}}}}]"#
        );
        let _events = server
            .mock("GET", "/api/0/buckets/aw-watcher-window_host/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let source = SummarySource::new(ActivityClient::new(server.url()));
        let summary = source.poll(60_000).await.unwrap();

        assert_eq!(summary.totals_by_key.get("Docs - firefox"), Some(&10_000));
        let window = summary.window_end - summary.window_start;
        assert_eq!(window.num_milliseconds(), 60_000);
    }

    #[tokio::test]
    async fn bucket_override_skips_discovery() {
        let mut server = mockito::Server::new_async().await;
        // No buckets endpoint mocked: discovery would fail.
        let _events = server
            .mock("GET", "/api/0/buckets/custom-bucket/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let source =
            SummarySource::new(ActivityClient::new(server.url())).with_bucket("custom-bucket");
        let summary = source.poll(60_000).await.unwrap();
        assert!(summary.totals_by_key.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_propagates_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let buckets = server
            .mock("GET", "/api/0/buckets")
            .with_status(502)
            .expect(1)
            .create_async()
            .await;

        let source = SummarySource::new(ActivityClient::new(server.url()));
        match source.poll(60_000).await {
            Err(CoreError::Upstream { status, .. }) => assert_eq!(status, 502),
            other => panic!("expected Upstream error, got {other:?}"),
        }
        buckets.assert_async().await;
    }
}

//! Read-only ActivityWatch REST client.
//!
//! Speaks the `/api/0` buckets/events surface. The client holds no mutable
//! state and is safe to share between concurrent polls. Non-success
//! responses surface as [`CoreError::Upstream`]; retries are the caller's
//! policy, never the client's.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{CoreError, Result};

/// A raw tracker event as returned by the buckets/events API.
///
/// The timestamp is kept as the raw RFC-3339 string so that a malformed row
/// degrades to zero contribution during aggregation instead of failing the
/// whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerEvent {
    pub timestamp: String,
    /// Active duration in fractional seconds. Absent means zero.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub data: WindowData,
}

/// Window-watcher payload attached to each event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowData {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Sort order for event queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSort {
    Asc,
    Desc,
}

impl EventSort {
    fn as_str(self) -> &'static str {
        match self {
            EventSort::Asc => "asc",
            EventSort::Desc => "desc",
        }
    }
}

/// Query parameters for [`ActivityClient::events`]. All optional.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<EventSort>,
}

/// HTTP client for an ActivityWatch-compatible tracker.
pub struct ActivityClient {
    base_url: String,
    http: reqwest::Client,
}

impl ActivityClient {
    /// Create a client for the given base URL (e.g. `http://127.0.0.1:5600`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// `GET /api/0/buckets` -- list bucket ids.
    ///
    /// ActivityWatch proper returns a map keyed by bucket id; some
    /// compatible trackers return a plain array. Both shapes are accepted.
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/0/buckets", self.base_url);
        let resp = check_status(self.http.get(&url).send().await?)?;
        let body: serde_json::Value = resp.json().await?;
        let ids = match body {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => other["id"].as_str().map(str::to_string),
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(ids)
    }

    /// `GET /api/0/buckets/{id}/events` -- timestamped interval samples.
    pub async fn events(&self, bucket_id: &str, query: &EventQuery) -> Result<Vec<TrackerEvent>> {
        let url = format!(
            "{}/api/0/buckets/{}/events",
            self.base_url,
            urlencoding::encode(bucket_id)
        );
        let mut req = self.http.get(&url);
        if let Some(start) = query.start {
            req = req.query(&[("start", start.to_rfc3339())]);
        }
        if let Some(end) = query.end {
            req = req.query(&[("end", end.to_rfc3339())]);
        }
        if let Some(limit) = query.limit {
            req = req.query(&[("limit", limit.to_string())]);
        }
        if let Some(offset) = query.offset {
            req = req.query(&[("offset", offset.to_string())]);
        }
        if let Some(sort) = query.sort {
            req = req.query(&[("sort", sort.as_str())]);
        }
        let resp = check_status(req.send().await?)?;
        Ok(resp.json().await?)
    }
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(CoreError::Upstream {
        status: status.as_u16(),
        message: status.canonical_reason().unwrap_or("unknown").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_buckets_accepts_map_shape() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/0/buckets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"aw-watcher-window_host": {"id": "aw-watcher-window_host"}}"#)
            .create_async()
            .await;

        let client = ActivityClient::new(server.url());
        let buckets = client.list_buckets().await.unwrap();
        assert_eq!(buckets, vec!["aw-watcher-window_host".to_string()]);
    }

    #[tokio::test]
    async fn list_buckets_accepts_array_shapes() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/0/buckets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["aw-watcher-window_a", {"id": "aw-watcher-afk_b"}, 42]"#)
            .create_async()
            .await;

        let client = ActivityClient::new(server.url());
        let buckets = client.list_buckets().await.unwrap();
        assert_eq!(buckets, vec!["aw-watcher-window_a", "aw-watcher-afk_b"]);
    }

    #[tokio::test]
    async fn non_success_surfaces_as_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/0/buckets")
            .with_status(500)
            .create_async()
            .await;

        let client = ActivityClient::new(server.url());
        match client.list_buckets().await {
            Err(CoreError::Upstream { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn events_sends_query_params_and_parses_rows() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/0/buckets/aw-watcher-window_host/events")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("sort".into(), "asc".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"timestamp": "2024-05-01T12:00:00+00:00", "duration": 12.5,
                     "data": {"app": "firefox", "title": "Docs"}},
                    {"timestamp": "not-a-timestamp"}
                ]"#,
            )
            .create_async()
            .await;

        let client = ActivityClient::new(server.url());
        let query = EventQuery {
            limit: Some(10),
            sort: Some(EventSort::Asc),
            ..Default::default()
        };
        let events = client
            .events("aw-watcher-window_host", &query)
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data.app.as_deref(), Some("firefox"));
        assert_eq!(events[0].duration, 12.5);
        // Malformed timestamps survive deserialization; the aggregator
        // skips them later.
        assert_eq!(events[1].timestamp, "not-a-timestamp");
        assert_eq!(events[1].duration, 0.0);
    }

    #[tokio::test]
    async fn events_on_missing_bucket_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/0/buckets/nope/events")
            .with_status(404)
            .create_async()
            .await;

        let client = ActivityClient::new(server.url());
        match client.events("nope", &EventQuery::default()).await {
            Err(CoreError::Upstream { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }
}

//! Time-series feed client (ThingSpeak-style read API)
//!
//! One request per field:
//!   GET {base}/channels/{channel}/fields/{field}.json?api_key={key}&results=1
//! Response body:
//!   { "channel": {...}, "feeds": [ { "created_at": "...", "field{N}": <value> } ] }
//!
//! Only the most recent feed entry is consumed. An empty `feeds` array is a
//! normal condition (channel has no data yet), not an error.

use crate::domain::{FieldId, Reading};
use crate::infra::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Source of latest field values. The poller only sees this trait, so tests
/// substitute a scripted double for the network client.
#[async_trait]
pub trait FieldSource: Send + Sync {
    /// Fetch the most recent reading for one field. `Ok(None)` means the
    /// channel has no data for the field yet.
    async fn latest(&self, field: FieldId) -> anyhow::Result<Option<Reading>>;
}

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    feeds: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Parse one feed response body and extract the latest value for `field`.
///
/// Feed values arrive as JSON strings or numbers depending on how the
/// channel was written; both are normalized to display text.
pub fn parse_latest(body: &str, field: FieldId) -> anyhow::Result<Option<Reading>> {
    let page: FeedPage = serde_json::from_str(body).context("malformed feed response")?;

    let Some(entry) = page.feeds.first() else {
        return Ok(None);
    };

    let value = match entry.get(&field.json_key()) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Null) | None => return Ok(None),
        Some(other) => anyhow::bail!("unexpected value type for {}: {}", field.json_key(), other),
    };

    let sampled_at = entry
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Some(Reading { field, value, sampled_at }))
}

/// HTTP client for the ThingSpeak-style read API.
pub struct ThingSpeakClient {
    base_url: String,
    channel_id: String,
    read_api_key: String,
    results: u8,
    client: reqwest::Client,
}

impl ThingSpeakClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // One client per process for connection pooling
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms()))
            .http1_only()
            .build()
            .context("failed to build feed HTTP client")?;

        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            channel_id: config.channel_id().to_string(),
            read_api_key: config.read_api_key().to_string(),
            results: config.results(),
            client,
        })
    }

    fn field_url(&self, field: FieldId) -> String {
        format!(
            "{}/channels/{}/fields/{}.json?api_key={}&results={}",
            self.base_url, self.channel_id, field, self.read_api_key, self.results
        )
    }
}

#[async_trait]
impl FieldSource for ThingSpeakClient {
    async fn latest(&self, field: FieldId) -> anyhow::Result<Option<Reading>> {
        let url = self.field_url(field);
        debug!(field = %field, "feed_request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("feed request failed for field {}", field))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("feed returned HTTP {} for field {}", status.as_u16(), field);
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read feed body for field {}", field))?;

        parse_latest(&body, field)
    }
}

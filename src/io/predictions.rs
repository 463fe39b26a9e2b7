//! Prediction endpoint client
//!
//! One request at startup:
//!   GET {predictions.url}
//! Response body: JSON map of "field{N}" to
//!   { "original": [...], "actual": [...], "predicted": [...], "accuracy": <0..1> }
//!
//! Fields absent from the response simply get no chart. Null entries are
//! dropped rather than treated as errors.

use crate::domain::{ChartSeries, FieldId};
use crate::infra::config::Config;
use anyhow::Context;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Parse a prediction response body into a field-keyed series map.
///
/// Keys that do not match the `field{N}` shape are ignored; the endpoint is
/// free to include bookkeeping entries the dashboard does not consume.
pub fn parse_response(body: &str) -> anyhow::Result<HashMap<FieldId, ChartSeries>> {
    let raw: HashMap<String, Option<ChartSeries>> =
        serde_json::from_str(body).context("malformed prediction response")?;

    let mut by_field = HashMap::new();
    for (key, series) in raw {
        let Some(series) = series else { continue };
        let Some(id) = key.strip_prefix("field").and_then(|n| n.parse::<u8>().ok()) else {
            debug!(key = %key, "prediction_key_ignored");
            continue;
        };
        by_field.insert(FieldId(id), series);
    }
    Ok(by_field)
}

/// HTTP client for the model training/prediction endpoint.
pub struct PredictionClient {
    url: String,
    client: reqwest::Client,
}

impl PredictionClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.predictions_timeout_ms()))
            .http1_only()
            .build()
            .context("failed to build prediction HTTP client")?;

        Ok(Self { url: config.predictions_url().to_string(), client })
    }

    /// Fetch the full prediction map. Invoked once at startup; failures are
    /// reported to the caller, which logs and carries on without charts.
    pub async fn fetch(&self) -> anyhow::Result<HashMap<FieldId, ChartSeries>> {
        debug!(url = %self.url, "prediction_request");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("prediction request failed: {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("prediction endpoint returned HTTP {}", status.as_u16());
        }

        let body = response.text().await.context("failed to read prediction body")?;
        parse_response(&body)
    }
}

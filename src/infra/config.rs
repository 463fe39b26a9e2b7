//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! The field mapping table is the single source of truth for what each feed
//! field id means. The two station profiles (indoor 8-field, outdoor
//! 7-field) assign different sensors to the same ids, so the mapping is
//! always loaded from the profile, never assumed.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

use crate::domain::FieldId;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    pub channel_id: String,
    pub read_api_key: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Number of results to request per field (the dashboard only uses the latest).
    #[serde(default = "default_results")]
    pub results: u8,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_results() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionsConfig {
    #[serde(default = "default_predictions_url")]
    pub url: String,
    #[serde(default = "default_predictions_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_predictions_enabled")]
    pub enabled: bool,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self {
            url: default_predictions_url(),
            timeout_ms: default_predictions_timeout_ms(),
            enabled: default_predictions_enabled(),
        }
    }
}

fn default_predictions_url() -> String {
    "http://localhost:5000/train-models".to_string()
}

fn default_predictions_timeout_ms() -> u64 {
    10_000
}

fn default_predictions_enabled() -> bool {
    true
}

/// One row of the field mapping table: which feed field feeds which display
/// slot, and how it is presented.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub id: u8,
    /// Display slot name (unique per profile).
    pub slot: String,
    /// Human label shown next to the value and in chart titles.
    pub label: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Dashboard page this slot belongs to.
    pub page: String,
    /// Whether this field gets an actual-vs-predicted chart.
    #[serde(default)]
    pub chart: bool,
    /// Explicit chart id; defaults to `chart_{slot}`.
    #[serde(default)]
    pub chart_id: Option<String>,
}

impl FieldSpec {
    pub fn field_id(&self) -> FieldId {
        FieldId(self.id)
    }

    pub fn chart_id(&self) -> String {
        self.chart_id.clone().unwrap_or_else(|| format!("chart_{}", self.slot))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub feed: FeedConfig,
    #[serde(default)]
    pub predictions: PredictionsConfig,
    #[serde(rename = "fields")]
    pub fields: Vec<FieldSpec>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    base_url: String,
    channel_id: String,
    read_api_key: String,
    poll_interval_ms: u64,
    request_timeout_ms: u64,
    results: u8,
    predictions_url: String,
    predictions_timeout_ms: u64,
    predictions_enabled: bool,
    fields: Vec<FieldSpec>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.thingspeak.com".to_string(),
            channel_id: "2965771".to_string(),
            read_api_key: "I6D9WGROEFOLZJIE".to_string(),
            poll_interval_ms: 5000,
            request_timeout_ms: 3000,
            results: 1,
            predictions_url: default_predictions_url(),
            predictions_timeout_ms: 10_000,
            predictions_enabled: true,
            fields: Self::default_field_table(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Indoor station profile: the 8-field channel layout.
    fn default_field_table() -> Vec<FieldSpec> {
        fn spec(id: u8, slot: &str, label: &str, unit: Option<&str>, page: &str) -> FieldSpec {
            FieldSpec {
                id,
                slot: slot.to_string(),
                label: label.to_string(),
                unit: unit.map(str::to_string),
                page: page.to_string(),
                chart: false,
                chart_id: None,
            }
        }

        vec![
            spec(1, "mq135_ppb", "MQ135 Air Quality", Some("ppb"), "gas"),
            spec(2, "mq7_ppb", "MQ7 Carbon Monoxide", Some("ppb"), "gas"),
            spec(3, "mq2_ppb", "MQ2 Flammable Gas", Some("ppb"), "gas"),
            FieldSpec {
                chart: true,
                chart_id: Some("chart_loudness".to_string()),
                ..spec(4, "dB", "Loudness (dB)", Some("dB"), "noise")
            },
            FieldSpec {
                chart: true,
                chart_id: Some("chart_pm25".to_string()),
                ..spec(5, "pm25", "PM2.5", Some("ug/m3"), "pm")
            },
            FieldSpec {
                chart: true,
                chart_id: Some("chart_pm10".to_string()),
                ..spec(6, "pm10", "PM10", Some("ug/m3"), "pm")
            },
            spec(7, "Temperature", "Temperature", Some("C"), "climate"),
            spec(8, "Humidity", "Humidity", Some("%"), "climate"),
        ]
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Self::validate_fields(&toml_config.fields)
            .with_context(|| format!("Invalid field table in {}", path.display()))?;

        Ok(Self {
            base_url: toml_config.feed.base_url,
            channel_id: toml_config.feed.channel_id,
            read_api_key: toml_config.feed.read_api_key,
            poll_interval_ms: toml_config.feed.poll_interval_ms,
            request_timeout_ms: toml_config.feed.request_timeout_ms,
            results: toml_config.feed.results,
            predictions_url: toml_config.predictions.url,
            predictions_timeout_ms: toml_config.predictions.timeout_ms,
            predictions_enabled: toml_config.predictions.enabled,
            fields: toml_config.fields,
            config_file: path.display().to_string(),
        })
    }

    /// Reject field tables that would make a poll cycle ambiguous: an empty
    /// table, a duplicate field id, or a duplicate slot name.
    fn validate_fields(fields: &[FieldSpec]) -> anyhow::Result<()> {
        if fields.is_empty() {
            bail!("field table is empty");
        }

        let mut ids = HashSet::new();
        let mut slots = HashSet::new();
        for field in fields {
            if !ids.insert(field.id) {
                bail!("duplicate field id {}", field.id);
            }
            if !slots.insert(field.slot.as_str()) {
                bail!("duplicate slot {:?}", field.slot);
            }
        }
        Ok(())
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn read_api_key(&self) -> &str {
        &self.read_api_key
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_ms
    }

    pub fn results(&self) -> u8 {
        self.results
    }

    pub fn predictions_url(&self) -> &str {
        &self.predictions_url
    }

    pub fn predictions_timeout_ms(&self) -> u64 {
        self.predictions_timeout_ms
    }

    pub fn predictions_enabled(&self) -> bool {
        self.predictions_enabled
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Field specs that carry an actual-vs-predicted chart, in table order.
    pub fn chart_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.chart)
    }

    /// Look up the mapping row for a field id.
    pub fn field_spec(&self, id: FieldId) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id.0)
    }

    /// Distinct dashboard pages in first-appearance order.
    pub fn pages(&self) -> Vec<String> {
        let mut pages = Vec::new();
        for field in &self.fields {
            if !pages.contains(&field.page) {
                pages.push(field.page.clone());
            }
        }
        pages
    }

    /// Builder method for tests to replace the field table
    #[cfg(test)]
    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    /// Builder method for tests to set the poll interval
    #[cfg(test)]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}

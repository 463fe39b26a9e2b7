//! Shared types for the sensor dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype wrapper for feed field ids to provide type safety.
///
/// Field ids are the small integers the time-series channel uses to address
/// its measurement columns (`field1`..`field8`). What a given id *means*
/// (loudness, PM2.5, ...) is defined only by the configured mapping table,
/// never by the id itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FieldId(pub u8);

impl FieldId {
    /// JSON key used by the feed and prediction endpoints for this field.
    pub fn json_key(&self) -> String {
        format!("field{}", self.0)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The latest value observed for one field.
///
/// Values arrive as JSON numbers or strings depending on the channel; the
/// dashboard only ever displays them as text, so they are normalized to a
/// string at the parsing boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub field: FieldId,
    pub value: String,
    /// Channel-side timestamp of the sample, when the feed provides one.
    pub sampled_at: Option<DateTime<Utc>>,
}

/// One entry of the prediction endpoint's response: an actual-vs-predicted
/// series pair with the model's accuracy ratio (0..1).
///
/// `original` carries the x-axis positions shared by both series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub original: Vec<f64>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub accuracy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_json_key() {
        assert_eq!(FieldId(1).json_key(), "field1");
        assert_eq!(FieldId(8).json_key(), "field8");
    }

    #[test]
    fn test_field_id_display() {
        assert_eq!(FieldId(5).to_string(), "5");
    }
}

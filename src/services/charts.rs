//! Actual-vs-predicted chart construction
//!
//! Charts are pure data: a `ChartSpec` is built from one prediction series
//! and describes everything a renderer needs (title, shared x-labels, the
//! two point sets). Repeated builds replace the previous chart set
//! wholesale; nothing accumulates.

use crate::domain::{ChartSeries, FieldId};
use crate::infra::config::Config;
use std::collections::HashMap;

/// Render description for one actual-vs-predicted line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// Stable chart identifier (e.g. `chart_pm25`).
    pub id: String,
    pub title: String,
    /// X-axis label sequence, shared by both datasets; taken from the
    /// series' `original` values.
    pub labels: Vec<String>,
    /// Actual series as (x, y) points; x is the label index.
    pub actual: Vec<(f64, f64)>,
    /// Predicted series as (x, y) points over the same x positions.
    pub predicted: Vec<(f64, f64)>,
    /// Accuracy ratio (0..1) as reported by the model.
    pub accuracy: f64,
}

/// Format a 0..1 accuracy ratio as a percentage with two decimals.
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.2}%", accuracy * 100.0)
}

impl ChartSpec {
    /// Build a chart description from one prediction series.
    pub fn from_series(id: &str, label: &str, series: &ChartSeries) -> Self {
        let labels: Vec<String> = series.original.iter().map(|v| v.to_string()).collect();

        let points = |values: &[f64]| -> Vec<(f64, f64)> {
            values
                .iter()
                .take(labels.len())
                .enumerate()
                .map(|(i, &y)| (i as f64, y))
                .collect()
        };

        let actual = points(&series.actual);
        let predicted = points(&series.predicted);

        Self {
            id: id.to_string(),
            title: format!("{} Prediction (Accuracy: {})", label, format_accuracy(series.accuracy)),
            labels,
            actual,
            predicted,
            accuracy: series.accuracy,
        }
    }

    /// Combined axis bounds over both datasets, padded by `margin` (a ratio
    /// of the data range) so lines do not hug the frame.
    pub fn bounds(&self, margin: f64) -> (f64, f64, f64, f64) {
        let ys = self.actual.iter().chain(self.predicted.iter()).map(|&(_, y)| y);
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for y in ys {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            return (0.0, 1.0, 0.0, 1.0);
        }

        let x_max = (self.labels.len().saturating_sub(1)) as f64;
        let pad = ((y_max - y_min) * margin).max(f64::EPSILON);
        (0.0, x_max.max(1.0), y_min - pad, y_max + pad)
    }
}

/// Build the chart set for every chart-enabled field present in the
/// prediction response, in field-table order. Fields the response does not
/// cover are skipped. The returned set replaces any previous one.
pub fn build_charts(
    config: &Config,
    predictions: &HashMap<FieldId, ChartSeries>,
) -> Vec<ChartSpec> {
    config
        .chart_fields()
        .filter_map(|spec| {
            predictions
                .get(&spec.field_id())
                .map(|series| ChartSpec::from_series(&spec.chart_id(), &spec.label, series))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(accuracy: f64) -> ChartSeries {
        ChartSeries {
            original: vec![1.0, 2.0, 3.0],
            actual: vec![40.0, 41.0, 42.0],
            predicted: vec![39.5, 41.2, 41.9],
            accuracy,
        }
    }

    #[test]
    fn test_accuracy_formatting() {
        assert_eq!(format_accuracy(0.8765), "87.65%");
        assert_eq!(format_accuracy(1.0), "100.00%");
        assert_eq!(format_accuracy(0.0), "0.00%");
    }

    #[test]
    fn test_title_includes_accuracy_percentage() {
        let spec = ChartSpec::from_series("chart_pm25", "PM2.5", &series(0.8765));
        assert_eq!(spec.title, "PM2.5 Prediction (Accuracy: 87.65%)");
    }

    #[test]
    fn test_datasets_share_label_sequence_from_original() {
        let spec = ChartSpec::from_series("chart_loudness", "Loudness (dB)", &series(0.9));
        assert_eq!(spec.labels, vec!["1", "2", "3"]);
        let actual_x: Vec<f64> = spec.actual.iter().map(|&(x, _)| x).collect();
        let predicted_x: Vec<f64> = spec.predicted.iter().map(|&(x, _)| x).collect();
        assert_eq!(actual_x, predicted_x);
        assert_eq!(actual_x.len(), spec.labels.len());
    }

    #[test]
    fn test_series_truncated_to_label_count() {
        let mut s = series(0.5);
        s.predicted.push(99.0);
        let spec = ChartSpec::from_series("c", "l", &s);
        assert_eq!(spec.predicted.len(), 3);
    }

    #[test]
    fn test_missing_field_yields_no_chart() {
        let config = Config::default();
        let mut predictions = HashMap::new();
        predictions.insert(FieldId(4), series(0.91));
        predictions.insert(FieldId(6), series(0.84));
        // field5 (pm25) intentionally absent

        let charts = build_charts(&config, &predictions);
        let ids: Vec<_> = charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["chart_loudness", "chart_pm10"]);
    }

    #[test]
    fn test_empty_response_yields_no_charts() {
        let charts = build_charts(&Config::default(), &HashMap::new());
        assert!(charts.is_empty());
    }

    #[test]
    fn test_rebuild_replaces_not_accumulates() {
        let config = Config::default();
        let mut predictions = HashMap::new();
        predictions.insert(FieldId(5), series(0.8));

        let first = build_charts(&config, &predictions);
        let second = build_charts(&config, &predictions);
        assert_eq!(first, second);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_bounds_cover_both_datasets() {
        let spec = ChartSpec::from_series("c", "l", &series(0.9));
        let (x_min, x_max, y_min, y_max) = spec.bounds(0.05);
        assert_eq!(x_min, 0.0);
        assert_eq!(x_max, 2.0);
        assert!(y_min < 39.5);
        assert!(y_max > 42.0);
    }

    #[test]
    fn test_bounds_with_empty_series() {
        let empty = ChartSeries { original: vec![], actual: vec![], predicted: vec![], accuracy: 0.0 };
        let spec = ChartSpec::from_series("c", "l", &empty);
        let (x_min, x_max, y_min, y_max) = spec.bounds(0.05);
        assert_eq!((x_min, x_max, y_min, y_max), (0.0, 1.0, 0.0, 1.0));
    }
}

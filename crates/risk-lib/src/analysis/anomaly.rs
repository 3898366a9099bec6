//! Outlier detection with Tukey fences
//!
//! Flags points outside [Q1 - k·IQR, Q3 + k·IQR]. Severity is judged
//! against the inliers, so a single extreme point cannot mask itself by
//! inflating the mean and standard deviation.

use crate::models::{AnomalyRecord, AnomalySeverity, MetricSeries};
use crate::series::stats;

/// Minimum samples required for anomaly detection
pub const MIN_ANOMALY_POINTS: usize = 10;

pub struct AnomalyDetector {
    /// Fence multiplier applied to the IQR
    pub iqr_multiplier: f64,
    /// Deviation in standard deviations that makes an anomaly "high"
    pub high_severity_sigma: f64,
}

impl AnomalyDetector {
    pub fn new(iqr_multiplier: f64, high_severity_sigma: f64) -> Self {
        Self {
            iqr_multiplier,
            high_severity_sigma,
        }
    }

    /// Tukey fences for `values`
    pub fn fences(&self, values: &[f64]) -> (f64, f64) {
        let q1 = stats::quantile(values, 0.25);
        let q3 = stats::quantile(values, 0.75);
        let iqr = q3 - q1;
        (q1 - self.iqr_multiplier * iqr, q3 + self.iqr_multiplier * iqr)
    }

    pub fn detect(&self, series: &MetricSeries) -> Vec<AnomalyRecord> {
        let values = series.values();
        if values.len() < MIN_ANOMALY_POINTS {
            return Vec::new();
        }

        // Zero variance: nothing can be an outlier
        if stats::std_dev(values) < f64::EPSILON {
            return Vec::new();
        }

        let (low, high) = self.fences(values);
        let is_outlier = |v: f64| v < low || v > high;

        let inliers: Vec<f64> = values.iter().copied().filter(|v| !is_outlier(*v)).collect();
        let baseline: &[f64] = if inliers.len() >= 2 { &inliers } else { values };
        let mean = stats::mean(baseline);
        let std_dev = stats::std_dev(baseline);

        series
            .timestamps()
            .iter()
            .zip(values)
            .filter(|(_, v)| is_outlier(**v))
            .map(|(ts, v)| {
                let severity = if (v - mean).abs() > self.high_severity_sigma * std_dev {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                };
                AnomalyRecord {
                    metric: series.name().to_string(),
                    timestamp: *ts,
                    value: *v,
                    expected_range: (low, high),
                    severity,
                }
            })
            .collect()
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(1.5, 3.0)
    }
}

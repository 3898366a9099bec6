//! Trend classification
//!
//! Fits an ordinary least squares line of value against sequential index
//! and classifies the slope relative to the series level.

use crate::models::{MetricSeries, TrendDirection, TrendResult};
use crate::series::stats;

/// Minimum points for a trend estimate
pub const MIN_TREND_POINTS: usize = 3;

/// Normalized slope beyond which a trend is directional
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 0.01;

pub struct TrendEstimator {
    pub slope_threshold: f64,
}

impl TrendEstimator {
    pub fn new(slope_threshold: f64) -> Self {
        Self { slope_threshold }
    }

    pub fn estimate(&self, series: &MetricSeries) -> TrendResult {
        let values = series.values();
        if values.len() < MIN_TREND_POINTS {
            return TrendResult {
                direction: TrendDirection::InsufficientData,
                normalized_slope: 0.0,
            };
        }

        let slope = stats::linear_regression_slope(values);
        let mean = stats::mean(values);
        // Normalize by magnitude so negative-valued metrics keep the slope sign
        let normalized_slope = if mean.abs() < f64::EPSILON {
            0.0
        } else {
            slope / mean.abs()
        };

        let direction = if values.windows(2).all(|w| w[1] > w[0]) {
            TrendDirection::Increasing
        } else if values.windows(2).all(|w| w[1] < w[0]) {
            TrendDirection::Decreasing
        } else if normalized_slope > self.slope_threshold {
            TrendDirection::Increasing
        } else if normalized_slope < -self.slope_threshold {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };

        TrendResult {
            direction,
            normalized_slope,
        }
    }
}

impl Default for TrendEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SLOPE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(values: Vec<f64>) -> MetricSeries {
        MetricSeries::daily("m", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), values)
    }

    #[test]
    fn test_insufficient_data() {
        let result = TrendEstimator::default().estimate(&series(vec![1.0, 2.0]));
        assert_eq!(result.direction, TrendDirection::InsufficientData);
        assert_eq!(result.normalized_slope, 0.0);
    }

    #[test]
    fn test_linear_decline_is_decreasing() {
        let values: Vec<f64> = (0..30).map(|i| 95.0 - 35.0 * i as f64 / 29.0).collect();
        let result = TrendEstimator::default().estimate(&series(values));
        assert_eq!(result.direction, TrendDirection::Decreasing);
        assert!(result.normalized_slope < -0.01);
    }

    #[test]
    fn test_strictly_monotonic_always_directional() {
        let estimator = TrendEstimator::default();
        let tiny = estimator.estimate(&series(vec![1000.0, 1000.001, 1000.002]));
        assert_eq!(tiny.direction, TrendDirection::Increasing);
        let negative = estimator.estimate(&series(vec![-10.0, -9.0, -8.0]));
        assert_eq!(negative.direction, TrendDirection::Increasing);
        assert!(negative.normalized_slope > 0.0);
        let down = estimator.estimate(&series(vec![3.0, 2.0, 1.0, 0.5]));
        assert_eq!(down.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_noisy_flat_is_stable() {
        let values = vec![50.0, 50.2, 49.9, 50.1, 49.8, 50.0, 50.2, 49.9];
        let result = TrendEstimator::default().estimate(&series(values));
        assert_eq!(result.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_zero_mean_has_zero_normalized_slope() {
        let values = vec![-1.0, 1.0, -1.0, 1.0, 0.0];
        let result = TrendEstimator::default().estimate(&series(values));
        assert_eq!(result.normalized_slope, 0.0);
        assert_eq!(result.direction, TrendDirection::Stable);
    }
}

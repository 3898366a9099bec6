//! Change point detection
//!
//! Slides a window over the series and compares the mean of the preceding
//! window with the mean of the following one. A shift larger than
//! `sigma_multiplier` rolling standard deviations marks a change point.

use crate::models::{ChangePointRecord, ChangeType, MetricSeries};
use crate::series::stats;

/// Minimum samples required for change point detection
pub const MIN_CHANGE_POINTS: usize = 20;

/// Upper bound on the comparison window
pub const MAX_WINDOW: usize = 7;

pub struct ChangePointDetector {
    pub sigma_multiplier: f64,
}

impl ChangePointDetector {
    pub fn new(sigma_multiplier: f64) -> Self {
        Self { sigma_multiplier }
    }

    /// Window size used for a series of `n` points
    pub fn window_size(n: usize) -> usize {
        MAX_WINDOW.min(n / 4)
    }

    pub fn detect(&self, series: &MetricSeries) -> Vec<ChangePointRecord> {
        let values = series.values();
        let n = values.len();
        if n < MIN_CHANGE_POINTS {
            return Vec::new();
        }

        let window = Self::window_size(n);
        let global_std = stats::std_dev(values);
        let mut points = Vec::new();

        // The first and last `window` points have nothing to compare against
        for i in window..n - window {
            let before = stats::mean(&values[i - window..i]);
            let after = stats::mean(&values[i..i + window]);
            let shift = after - before;

            let rolling = stats::std_dev(&values[i + 1 - window..=i]);
            let threshold_std = if rolling.is_finite() && rolling > f64::EPSILON {
                rolling
            } else {
                global_std
            };

            if shift.abs() > self.sigma_multiplier * threshold_std {
                points.push(ChangePointRecord {
                    metric: series.name().to_string(),
                    timestamp: series.timestamps()[i],
                    before_value: before,
                    after_value: after,
                    magnitude: shift.abs(),
                    change_type: if shift > 0.0 {
                        ChangeType::Increase
                    } else {
                        ChangeType::Decrease
                    },
                });
            }
        }

        points
    }
}

impl Default for ChangePointDetector {
    fn default() -> Self {
        Self::new(2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: Vec<f64>) -> MetricSeries {
        MetricSeries::daily(
            "on_time_delivery",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            values,
        )
    }

    #[test]
    fn test_window_size() {
        assert_eq!(ChangePointDetector::window_size(20), 5);
        assert_eq!(ChangePointDetector::window_size(30), 7);
        assert_eq!(ChangePointDetector::window_size(100), 7);
    }

    #[test]
    fn test_insufficient_samples() {
        let values: Vec<f64> = (0..19).map(|i| if i < 10 { 90.0 } else { 50.0 }).collect();
        assert!(ChangePointDetector::default().detect(&series(values)).is_empty());
    }

    #[test]
    fn test_constant_series_has_no_change_points() {
        assert!(ChangePointDetector::default().detect(&series(vec![75.0; 40])).is_empty());
    }

    #[test]
    fn test_step_down_detected_at_step() {
        let values: Vec<f64> = (0..40)
            .map(|i| {
                let noise = [0.5, -0.5, 0.3, -0.3][i % 4];
                if i < 20 { 90.0 + noise } else { 60.0 + noise }
            })
            .collect();
        let points = ChangePointDetector::default().detect(&series(values));
        assert!(!points.is_empty());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let step = points
            .iter()
            .find(|p| p.timestamp == start + Duration::days(20))
            .expect("change point at the step");
        assert_eq!(step.change_type, ChangeType::Decrease);
        assert!((step.magnitude - 30.0).abs() < 1.0);
        assert!(points.iter().all(|p| p.change_type == ChangeType::Decrease));
    }

    #[test]
    fn test_edges_never_evaluated() {
        let mut values = vec![50.0; 30];
        values[29] = 500.0;
        values[0] = -500.0;
        let points = ChangePointDetector::default().detect(&series(values));
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for p in &points {
            let idx = (p.timestamp - start).num_days();
            assert!((7..23).contains(&idx), "index {idx} outside evaluated range");
        }
    }
}

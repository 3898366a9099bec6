//! Seasonality detection via classical additive decomposition

use crate::error::{AnalysisError, Result};
use crate::models::{MetricSeries, SeasonalityResult};
use crate::series::stats;
use tracing::debug;

/// Seasonality needs strictly more points than this
pub const MIN_SEASONAL_POINTS: usize = 24;

/// Weekly cycle for daily data
pub const DEFAULT_PERIOD: usize = 7;

/// std(seasonal) / std(series) above which a cycle is significant
pub const DEFAULT_STRENGTH_THRESHOLD: f64 = 0.1;

/// Additive decomposition: value = trend + seasonal + residual
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub period: usize,
    /// Centered moving average; `None` at the edges
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    /// Per-phase seasonal indices, centered to zero mean
    pub indices: Vec<f64>,
}

/// Decompose `values` with a fixed period
pub fn decompose(values: &[f64], period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(AnalysisError::Decomposition(format!("invalid period {period}")));
    }
    if values.len() < 2 * period {
        return Err(AnalysisError::Decomposition(format!(
            "need two complete cycles of {period}, got {} points",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::Decomposition("non-finite values".to_string()));
    }

    let trend = stats::centered_moving_average(values, period);

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (v, t)) in values.iter().zip(&trend).enumerate() {
        if let Some(t) = t {
            sums[i % period] += v - t;
            counts[i % period] += 1;
        }
    }
    if counts.iter().any(|c| *c == 0) {
        return Err(AnalysisError::Decomposition(
            "seasonal phase without detrended observations".to_string(),
        ));
    }

    let raw: Vec<f64> = sums.iter().zip(&counts).map(|(s, c)| s / *c as f64).collect();
    let offset = stats::mean(&raw);
    let indices: Vec<f64> = raw.iter().map(|r| r - offset).collect();
    let seasonal = (0..values.len()).map(|i| indices[i % period]).collect();

    Ok(Decomposition {
        period,
        trend,
        seasonal,
        indices,
    })
}

/// Flags metrics with a significant periodic component
pub struct SeasonalityDetector {
    pub period: usize,
    pub strength_threshold: f64,
}

impl SeasonalityDetector {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
        }
    }

    /// Seasonality test; errors are left to the caller to downgrade
    pub fn try_detect(&self, series: &MetricSeries) -> Result<SeasonalityResult> {
        let values = series.values();
        if values.len() <= MIN_SEASONAL_POINTS {
            return Err(AnalysisError::insufficient(MIN_SEASONAL_POINTS + 1, values.len()));
        }

        let series_std = stats::population_std_dev(values);
        if series_std < f64::EPSILON {
            return Err(AnalysisError::Decomposition("zero variance series".to_string()));
        }

        let decomposition = decompose(values, self.period)?;
        let strength = stats::population_std_dev(&decomposition.seasonal) / series_std;

        Ok(SeasonalityResult {
            seasonal: strength > self.strength_threshold,
            strength,
            period: self.period,
        })
    }

    /// Best-effort seasonality test: any failure reads as "not seasonal"
    pub fn detect(&self, series: &MetricSeries) -> SeasonalityResult {
        self.try_detect(series).unwrap_or_else(|e| {
            debug!(metric = %series.name(), error = %e, "Seasonality test skipped");
            SeasonalityResult {
                seasonal: false,
                strength: 0.0,
                period: self.period,
            }
        })
    }
}

impl Default for SeasonalityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(values: Vec<f64>) -> MetricSeries {
        MetricSeries::daily("m", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), values)
    }

    fn weekly(n: usize, amplitude: f64) -> Vec<f64> {
        let pattern = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, -9.0];
        (0..n)
            .map(|i| 100.0 + 0.05 * i as f64 + amplitude * pattern[i % 7])
            .collect()
    }

    #[test]
    fn test_weekly_pattern_is_seasonal() {
        let result = SeasonalityDetector::default().detect(&series(weekly(42, 1.0)));
        assert!(result.seasonal);
        assert!(result.strength > 0.1);
        assert_eq!(result.period, 7);
    }

    #[test]
    fn test_linear_series_is_not_seasonal() {
        let values: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
        let result = SeasonalityDetector::default().detect(&series(values));
        assert!(!result.seasonal);
        assert!(result.strength < 0.1);
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let detector = SeasonalityDetector::default();
        let short = series(weekly(24, 1.0));
        assert!(matches!(
            detector.try_detect(&short),
            Err(AnalysisError::InsufficientData { required: 25, actual: 24 })
        ));
        assert!(!detector.detect(&short).seasonal);
    }

    #[test]
    fn test_constant_series_downgrades_to_not_seasonal() {
        let flat = series(vec![5.0; 30]);
        let detector = SeasonalityDetector::default();
        assert!(matches!(
            detector.try_detect(&flat),
            Err(AnalysisError::Decomposition(_))
        ));
        assert!(!detector.detect(&flat).seasonal);
    }

    #[test]
    fn test_decomposition_recovers_indices() {
        let values = weekly(35, 1.0);
        let d = decompose(&values, 7).unwrap();
        assert!((d.indices.iter().sum::<f64>()).abs() < 1e-9);
        // pattern mean is 0, so indices match the pattern closely
        assert!((d.indices[6] + 9.0).abs() < 1e-6);
        for ((v, t), s) in values.iter().zip(&d.trend).zip(&d.seasonal) {
            if let Some(t) = t {
                assert!((v - t - s).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_decompose_rejects_short_input() {
        assert!(decompose(&[1.0; 10], 7).is_err());
        assert!(decompose(&[1.0, f64::NAN, 1.0, 1.0], 1).is_err());
    }
}

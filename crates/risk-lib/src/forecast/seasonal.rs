//! Additive trend + seasonal forecaster
//!
//! Removes the seasonal indices from an additive decomposition, fits a
//! linear trend to the deseasonalized series and projects both forward.

use super::ForecastingStrategy;
use crate::analysis::decompose;
use crate::error::{AnalysisError, Result};
use crate::models::{ForecastResult, MetricSeries};
use crate::series::stats;

pub struct SeasonalForecaster {
    pub period: usize,
    pub z: f64,
}

impl SeasonalForecaster {
    pub fn new(period: usize, z: f64) -> Self {
        Self { period, z }
    }
}

impl ForecastingStrategy for SeasonalForecaster {
    fn forecast(&self, series: &MetricSeries, horizon: usize) -> Result<ForecastResult> {
        let values = series.values();
        let n = values.len();
        let required = 2 * self.period;
        if n < required {
            return Err(AnalysisError::insufficient(required, n));
        }

        let decomposition = decompose(values, self.period)?;
        let deseasonalized: Vec<f64> = values
            .iter()
            .zip(&decomposition.seasonal)
            .map(|(v, s)| v - s)
            .collect();
        let (slope, intercept) = stats::linear_fit(&deseasonalized);

        let residuals: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| v - (intercept + slope * i as f64 + decomposition.seasonal[i]))
            .collect();
        let margin = self.z * stats::std_dev(&residuals);

        let mut forecast = Vec::with_capacity(horizon);
        let mut lower_bound = Vec::with_capacity(horizon);
        let mut upper_bound = Vec::with_capacity(horizon);
        for t in n..n + horizon {
            let value = intercept + slope * t as f64 + decomposition.indices[t % self.period];
            forecast.push(value);
            lower_bound.push(value - margin);
            upper_bound.push(value + margin);
        }

        Ok(ForecastResult {
            values: forecast,
            lower_bound,
            upper_bound,
            method: self.name().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "seasonal_trend"
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
    fn test_reproduces_weekly_pattern() {
        let pattern = [0.0, 4.0, 4.0, 2.0, -2.0, -4.0, -4.0];
        let values: Vec<f64> = (0..42).map(|i| 60.0 + 0.5 * i as f64 + pattern[i % 7]).collect();
        let result = SeasonalForecaster::new(7, 1.96).forecast(&series(values), 7).unwrap();
        for (h, value) in result.values.iter().enumerate() {
            let t = 42 + h;
            let expected = 60.0 + 0.5 * t as f64 + pattern[t % 7];
            assert!((value - expected).abs() < 1e-6, "step {h}: {value} vs {expected}");
        }
        assert_eq!(result.method, "seasonal_trend");
    }

    #[test]
    fn test_requires_two_cycles() {
        let err = SeasonalForecaster::new(7, 1.96)
            .forecast(&series(vec![1.0; 13]), 3)
            .unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 14, actual: 13 });
    }
}

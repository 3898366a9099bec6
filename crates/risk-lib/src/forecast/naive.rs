//! Naive linear extrapolation from the trailing window

use super::{default_bounds, ForecastingStrategy};
use crate::error::{AnalysisError, Result};
use crate::models::{ForecastResult, MetricSeries};

/// Default trailing window
const DEFAULT_WINDOW: usize = 7;

/// Extends the endpoint-to-endpoint slope of the last `window` points
pub struct NaiveForecaster {
    pub window: usize,
    pub z: f64,
}

impl NaiveForecaster {
    pub fn new(z: f64) -> Self {
        Self {
            window: DEFAULT_WINDOW,
            z,
        }
    }
}

impl ForecastingStrategy for NaiveForecaster {
    fn forecast(&self, series: &MetricSeries, horizon: usize) -> Result<ForecastResult> {
        let values = series.values();
        let n = values.len();
        if n == 0 {
            return Err(AnalysisError::insufficient(1, 0));
        }

        let window = self.window.max(1).min(n);
        let recent = &values[n - window..];
        let first = recent[0];
        let mut last = recent[window - 1];
        let slope = if window > 1 {
            (last - first) / (window - 1) as f64
        } else {
            0.0
        };

        let mut forecast = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            last += slope;
            forecast.push(last);
        }

        let (lower_bound, upper_bound) = default_bounds(series, &forecast, self.z);
        Ok(ForecastResult {
            values: forecast,
            lower_bound,
            upper_bound,
            method: self.name().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "naive_linear"
    }
}

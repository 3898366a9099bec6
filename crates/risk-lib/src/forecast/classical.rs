//! ARIMA(1,1,0) forecaster
//!
//! Fits an AR(1) model with drift to the first differences by least squares
//! and integrates the forecast differences back onto the last level.

use super::ForecastingStrategy;
use crate::error::{AnalysisError, Result};
use crate::models::{ForecastResult, MetricSeries};
use crate::series::stats;

/// Minimum samples required for a stable AR fit
const MIN_SAMPLES: usize = 10;

/// Largest |phi| accepted as stationary
const MAX_AR_COEFFICIENT: f64 = 0.999;

pub struct ClassicalForecaster {
    pub z: f64,
}

impl ClassicalForecaster {
    pub fn new(z: f64) -> Self {
        Self { z }
    }
}

/// Fitted AR(1) on differences: d_t - mu = phi (d_{t-1} - mu) + e_t
#[derive(Debug, Clone, Copy)]
struct ArFit {
    drift: f64,
    phi: f64,
    sigma: f64,
}

fn fit(values: &[f64]) -> Result<ArFit> {
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let drift = stats::mean(&diffs);
    let centered: Vec<f64> = diffs.iter().map(|d| d - drift).collect();

    let num: f64 = centered.windows(2).map(|w| w[1] * w[0]).sum();
    let den: f64 = centered[..centered.len() - 1].iter().map(|c| c * c).sum();
    if den < f64::EPSILON {
        return Err(AnalysisError::Decomposition(
            "differences have no variance".to_string(),
        ));
    }

    let phi = num / den;
    if !phi.is_finite() || phi.abs() > MAX_AR_COEFFICIENT {
        return Err(AnalysisError::Decomposition(format!(
            "non-stationary AR coefficient {phi:.3}"
        )));
    }

    let residuals: Vec<f64> = centered.windows(2).map(|w| w[1] - phi * w[0]).collect();
    let sigma = stats::std_dev(&residuals);

    Ok(ArFit { drift, phi, sigma })
}

impl ForecastingStrategy for ClassicalForecaster {
    fn forecast(&self, series: &MetricSeries, horizon: usize) -> Result<ForecastResult> {
        let values = series.values();
        if values.len() < MIN_SAMPLES {
            return Err(AnalysisError::insufficient(MIN_SAMPLES, values.len()));
        }

        let ArFit { drift, phi, sigma } = fit(values)?;

        let mut level = values[values.len() - 1];
        let mut prev = values[values.len() - 1] - values[values.len() - 2] - drift;
        // psi weights of the integrated process accumulate the error variance
        let mut psi = 0.0;
        let mut phi_power = 1.0;
        let mut variance = 0.0;

        let mut forecast = Vec::with_capacity(horizon);
        let mut lower_bound = Vec::with_capacity(horizon);
        let mut upper_bound = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = phi * prev;
            level += drift + next;
            prev = next;

            psi += phi_power;
            phi_power *= phi;
            variance += psi * psi;
            let margin = self.z * sigma * variance.sqrt();

            forecast.push(level);
            lower_bound.push(level - margin);
            upper_bound.push(level + margin);
        }

        Ok(ForecastResult {
            values: forecast,
            lower_bound,
            upper_bound,
            method: self.name().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "arima_110"
    }
}

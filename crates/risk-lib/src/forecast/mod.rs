//! Forecasting engine
//!
//! Strategies are tried in priority order; a strategy that cannot fit the
//! series hands over to the next one, ending with naive extrapolation.

mod classical;
mod naive;
mod seasonal;

pub use classical::ClassicalForecaster;
pub use naive::NaiveForecaster;
pub use seasonal::SeasonalForecaster;

use crate::config::ForecastMethod;
use crate::error::{AnalysisError, Result};
use crate::models::{ForecastResult, MetricSeries};
use tracing::{debug, warn};

/// z value of a two-sided 95% interval
pub const DEFAULT_Z: f64 = 1.96;

/// Trait for point forecast implementations
pub trait ForecastingStrategy: Send + Sync {
    /// Forecast exactly `horizon` future points
    fn forecast(&self, series: &MetricSeries, horizon: usize) -> Result<ForecastResult>;

    /// Method name reported in the forecast
    fn name(&self) -> &'static str;
}

/// ±z·σ of the historical series around each point.
///
/// This is an approximation for strategies without their own interval,
/// not a statistically rigorous prediction interval.
pub fn default_bounds(series: &MetricSeries, values: &[f64], z: f64) -> (Vec<f64>, Vec<f64>) {
    let margin = z * series.std_dev();
    let lower = values.iter().map(|v| v - margin).collect();
    let upper = values.iter().map(|v| v + margin).collect();
    (lower, upper)
}

/// A strategy that failed before the forecast succeeded
#[derive(Debug, Clone)]
pub struct Fallback {
    pub strategy: &'static str,
    pub error: AnalysisError,
}

/// Ordered chain of forecasting strategies
pub struct Forecaster {
    strategies: Vec<Box<dyn ForecastingStrategy>>,
}

impl Forecaster {
    /// Chain starting at `method` and falling back to the simpler tiers
    pub fn new(method: ForecastMethod, period: usize, z: f64) -> Self {
        let mut strategies: Vec<Box<dyn ForecastingStrategy>> = Vec::new();
        if method == ForecastMethod::Seasonal {
            strategies.push(Box::new(SeasonalForecaster::new(period, z)));
        }
        if matches!(method, ForecastMethod::Seasonal | ForecastMethod::Classical) {
            strategies.push(Box::new(ClassicalForecaster::new(z)));
        }
        strategies.push(Box::new(NaiveForecaster::new(z)));
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ForecastingStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn forecast(&self, series: &MetricSeries, horizon: usize) -> Result<ForecastResult> {
        self.forecast_with_fallbacks(series, horizon)
            .map(|(result, _)| result)
    }

    /// Forecast and report which strategies were skipped on the way
    pub fn forecast_with_fallbacks(
        &self,
        series: &MetricSeries,
        horizon: usize,
    ) -> Result<(ForecastResult, Vec<Fallback>)> {
        if horizon == 0 {
            return Err(AnalysisError::InvalidHorizon(horizon));
        }
        if series.is_empty() {
            return Err(AnalysisError::insufficient(1, 0));
        }

        let mut fallbacks = Vec::new();
        for strategy in &self.strategies {
            match strategy.forecast(series, horizon) {
                Ok(result) if result.horizon() == horizon => {
                    debug!(
                        metric = %series.name(),
                        method = %result.method,
                        horizon = horizon,
                        "Forecast generated"
                    );
                    return Ok((order_bounds(result), fallbacks));
                }
                Ok(result) => {
                    let error = AnalysisError::Decomposition(format!(
                        "{} returned {} points, expected {}",
                        strategy.name(),
                        result.horizon(),
                        horizon
                    ));
                    warn!(metric = %series.name(), error = %error, "Discarding forecast");
                    fallbacks.push(Fallback {
                        strategy: strategy.name(),
                        error,
                    });
                }
                Err(error) => {
                    warn!(
                        metric = %series.name(),
                        strategy = strategy.name(),
                        error = %error,
                        "Forecasting strategy failed, falling back"
                    );
                    fallbacks.push(Fallback {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }

        Err(fallbacks
            .pop()
            .map(|f| f.error)
            .unwrap_or_else(|| AnalysisError::Decomposition("no forecasting strategy configured".to_string())))
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(ForecastMethod::default(), 7, DEFAULT_Z)
    }
}

/// Guarantee lower <= value <= upper at every step
fn order_bounds(mut result: ForecastResult) -> ForecastResult {
    for ((value, lower), upper) in result
        .values
        .iter()
        .zip(result.lower_bound.iter_mut())
        .zip(result.upper_bound.iter_mut())
    {
        *lower = lower.min(*value);
        *upper = upper.max(*value);
    }
    result
}

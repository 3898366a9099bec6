//! Aggregate forecast outlook across metrics

use crate::models::{ForecastResult, Predictions, RiskLevel, RiskTrend};
use serde::Serialize;

/// Relative change treated as movement rather than noise
pub const CHANGE_THRESHOLD: f64 = 0.05;

/// Metric name fragments where a lower value is better
const LOWER_IS_BETTER: &[&str] = &[
    "defect",
    "delay",
    "lead_time",
    "response_time",
    "cost",
    "price",
    "complaint",
    "risk",
    "incident",
    "concentration",
];

/// Whether a decrease in this metric is an improvement
pub fn lower_is_better(metric: &str) -> bool {
    let name = metric.to_ascii_lowercase();
    LOWER_IS_BETTER.iter().any(|fragment| name.contains(fragment))
}

/// Forecast movement of a single metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOutlook {
    pub metric: String,
    /// Relative change from the current value to the forecast end,
    /// signed so that positive is an improvement
    pub signed_change: f64,
    pub confidence: f64,
}

impl MetricOutlook {
    pub fn new(metric: &str, current: f64, forecast: &ForecastResult) -> Self {
        let end = forecast.values.last().copied().unwrap_or(current);
        let change = if current.abs() < f64::EPSILON {
            0.0
        } else {
            (end - current) / current.abs()
        };
        let signed_change = if lower_is_better(metric) { -change } else { change };
        Self {
            metric: metric.to_string(),
            signed_change,
            confidence: interval_confidence(forecast),
        }
    }

    pub fn is_deteriorating(&self) -> bool {
        self.signed_change < -CHANGE_THRESHOLD
    }
}

/// Confidence from the relative width of the prediction interval
fn interval_confidence(forecast: &ForecastResult) -> f64 {
    let n = forecast.values.len();
    if n == 0 {
        return 0.0;
    }
    let half_width: f64 = forecast
        .upper_bound
        .iter()
        .zip(&forecast.lower_bound)
        .map(|(u, l)| (u - l) / 2.0)
        .sum::<f64>()
        / n as f64;
    let level = forecast.values.iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    if level < f64::EPSILON {
        return 0.1;
    }
    (1.0 - half_width / level).clamp(0.1, 0.95)
}

/// Combine per-metric outlooks into the vendor-level trend and prediction
pub fn summarize(outlooks: &[MetricOutlook], horizon_days: usize) -> (RiskTrend, Predictions) {
    if outlooks.is_empty() {
        return (
            RiskTrend::Stable,
            Predictions {
                risk_level: RiskLevel::Low,
                confidence: 0.0,
                horizon_days,
            },
        );
    }

    let n = outlooks.len() as f64;
    let average = outlooks.iter().map(|o| o.signed_change).sum::<f64>() / n;
    let trend = if average > CHANGE_THRESHOLD {
        RiskTrend::Improving
    } else if average < -CHANGE_THRESHOLD {
        RiskTrend::Deteriorating
    } else {
        RiskTrend::Stable
    };

    let deteriorating = outlooks.iter().filter(|o| o.is_deteriorating()).count() as f64 / n;
    let risk_level = if deteriorating > 0.5 && average < -4.0 * CHANGE_THRESHOLD {
        RiskLevel::Critical
    } else if deteriorating > 0.5 {
        RiskLevel::High
    } else if deteriorating > 0.25 || trend == RiskTrend::Deteriorating {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let confidence = outlooks.iter().map(|o| o.confidence).sum::<f64>() / n;

    (
        trend,
        Predictions {
            risk_level,
            confidence,
            horizon_days,
        },
    )
}

//! Core data models for vendor risk analysis

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw historical record: field name to JSON value
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Named, timestamp-ordered numeric sequence for one performance indicator
///
/// Timestamps are strictly increasing with no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    name: String,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl MetricSeries {
    /// Build a daily series starting at `start`
    pub fn daily(name: impl Into<String>, start: DateTime<Utc>, values: Vec<f64>) -> Self {
        let timestamps = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self {
            name: name.into(),
            timestamps,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Most recent observation
    pub fn last(&self) -> Option<(DateTime<Utc>, f64)> {
        self.timestamps.last().copied().zip(self.values.last().copied())
    }

    pub fn mean(&self) -> f64 {
        crate::series::stats::mean(&self.values)
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        crate::series::stats::std_dev(&self.values)
    }
}

/// Coarse direction of a metric over its observed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub normalized_slope: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityResult {
    pub seasonal: bool,
    /// std(seasonal component) / std(series)
    pub strength: f64,
    pub period: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Medium,
    High,
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalySeverity::Medium => write!(f, "medium"),
            AnomalySeverity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub metric: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub expected_range: (f64, f64),
    pub severity: AnomalySeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Increase,
    Decrease,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Increase => write!(f, "increase"),
            ChangeType::Decrease => write!(f, "decrease"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointRecord {
    pub metric: String,
    pub timestamp: DateTime<Utc>,
    pub before_value: f64,
    pub after_value: f64,
    pub magnitude: f64,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
}

/// Point forecast with confidence bounds; every sequence is `horizon` long
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub values: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub method: String,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.values.len()
    }
}

/// Risk severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Structured statement that a condition poses risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub level: RiskLevel,
    pub category: String,
    pub description: String,
    pub impact: String,
    /// Probability the risk materializes, 0.0-1.0
    pub likelihood: f64,
    /// Confidence in the finding itself, 0.0-1.0
    pub confidence: f64,
    pub time_to_impact_days: u32,
    pub mitigation_strategies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTrend {
    Improving,
    Deteriorating,
    Stable,
}

impl std::fmt::Display for RiskTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTrend::Improving => write!(f, "improving"),
            RiskTrend::Deteriorating => write!(f, "deteriorating"),
            RiskTrend::Stable => write!(f, "stable"),
        }
    }
}

/// Aggregate outlook derived from the per-metric forecasts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub horizon_days: usize,
}

/// Per-metric results; missing sub-analyses are omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    pub current_value: f64,
    pub mean: f64,
    pub trend: TrendResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<SeasonalityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastResult>,
}

/// A sub-analysis that was downgraded to "no signal"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedAnalysis {
    pub metric: String,
    pub analysis: String,
    pub reason: String,
}

/// Complete analysis output for one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorAnalysis {
    pub metrics_analysis: BTreeMap<String, MetricAnalysis>,
    pub anomalies: Vec<AnomalyRecord>,
    pub change_points: Vec<ChangePointRecord>,
    pub predictions: Predictions,
    pub risk_trend: RiskTrend,
    pub risk_findings: Vec<RiskFinding>,
    #[serde(default)]
    pub degraded: Vec<DegradedAnalysis>,
    pub generated_at: i64,
}

/// Current vendor metric values; absent indicators are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorMetrics {
    /// Percent of deliveries on time, 0-100
    pub on_time_delivery: Option<f64>,
    /// Quality score, 0-100
    pub quality_score: Option<f64>,
    /// Financial health score, 0-100
    pub financial_health_score: Option<f64>,
    /// Compliance score, 0-100
    pub compliance_score: Option<f64>,
    /// Defective units, percent
    pub defect_rate: Option<f64>,
    pub response_time_hours: Option<f64>,
    /// Price deviation from contract, percent
    pub price_variance: Option<f64>,
    /// Share of category spend with this vendor, 0.0-1.0
    pub spend_concentration: Option<f64>,
}

impl VendorMetrics {
    /// Take the latest observation of each known indicator
    pub fn from_series(series: &[MetricSeries]) -> Self {
        let latest = |name: &str| {
            series
                .iter()
                .find(|s| s.name() == name)
                .and_then(|s| s.last())
                .map(|(_, v)| v)
        };
        Self {
            on_time_delivery: latest("on_time_delivery"),
            quality_score: latest("quality_score"),
            financial_health_score: latest("financial_health_score"),
            compliance_score: latest("compliance_score"),
            defect_rate: latest("defect_rate"),
            response_time_hours: latest("response_time_hours"),
            price_variance: latest("price_variance"),
            spend_concentration: latest("spend_concentration"),
        }
    }

    /// Fill unset fields from `fallback`
    pub fn or(self, fallback: VendorMetrics) -> Self {
        Self {
            on_time_delivery: self.on_time_delivery.or(fallback.on_time_delivery),
            quality_score: self.quality_score.or(fallback.quality_score),
            financial_health_score: self
                .financial_health_score
                .or(fallback.financial_health_score),
            compliance_score: self.compliance_score.or(fallback.compliance_score),
            defect_rate: self.defect_rate.or(fallback.defect_rate),
            response_time_hours: self.response_time_hours.or(fallback.response_time_hours),
            price_variance: self.price_variance.or(fallback.price_variance),
            spend_concentration: self.spend_concentration.or(fallback.spend_concentration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_vendor_metrics_from_series() {
        let series = vec![
            MetricSeries::daily("on_time_delivery", day(1), vec![90.0, 85.0]),
            MetricSeries::daily("unrelated", day(1), vec![1.0, 2.0]),
        ];
        let metrics = VendorMetrics::from_series(&series);
        assert_eq!(metrics.on_time_delivery, Some(85.0));
        assert_eq!(metrics.quality_score, None);
    }

    #[test]
    fn test_explicit_metrics_win() {
        let explicit = VendorMetrics {
            quality_score: Some(50.0),
            ..Default::default()
        };
        let derived = VendorMetrics {
            quality_score: Some(90.0),
            on_time_delivery: Some(75.0),
            ..Default::default()
        };
        let merged = explicit.or(derived);
        assert_eq!(merged.quality_score, Some(50.0));
        assert_eq!(merged.on_time_delivery, Some(75.0));
    }

    #[test]
    fn test_risk_level_ordering_and_serde() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&TrendDirection::InsufficientData).unwrap(),
            "\"insufficient_data\""
        );
    }
}

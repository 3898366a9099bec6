//! Analysis configuration
//!
//! Loaded from an optional file plus `VRISK_*` environment overrides
//! (nested keys use `__`, e.g. `VRISK_PRIORITY__DECAY_EXPONENT=0.5`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Highest forecasting tier to attempt; lower tiers are the fallbacks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMethod {
    /// Trend plus weekly seasonal model
    #[default]
    #[serde(alias = "advanced")]
    Seasonal,
    /// ARIMA(1,1,0)
    #[serde(alias = "arima")]
    Classical,
    /// Linear extrapolation from the trailing window
    #[serde(alias = "linear")]
    Naive,
}

impl FromStr for ForecastMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seasonal" | "advanced" => Ok(ForecastMethod::Seasonal),
            "classical" | "arima" => Ok(ForecastMethod::Classical),
            "naive" | "linear" => Ok(ForecastMethod::Naive),
            other => Err(format!("unknown forecast method: {other}")),
        }
    }
}

impl std::fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastMethod::Seasonal => write!(f, "seasonal"),
            ForecastMethod::Classical => write!(f, "classical"),
            ForecastMethod::Naive => write!(f, "naive"),
        }
    }
}

/// Coefficients of the finding priority formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    pub critical_weight: f64,
    pub high_weight: f64,
    pub medium_weight: f64,
    pub low_weight: f64,
    /// Exponent applied to time-to-impact (0.5 = square root)
    pub decay_exponent: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            critical_weight: 4.0,
            high_weight: 3.0,
            medium_weight: 2.0,
            low_weight: 1.0,
            decay_exponent: 0.5,
        }
    }
}

/// Hard thresholds for the rule layer of the risk ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    pub on_time_delivery_high: f64,
    pub on_time_delivery_critical: f64,
    pub quality_medium: f64,
    pub quality_high: f64,
    pub financial_high: f64,
    pub financial_critical: f64,
    pub compliance_medium: f64,
    pub compliance_high: f64,
    pub defect_rate: f64,
    pub response_time_hours: f64,
    pub price_variance: f64,
    pub spend_concentration: f64,
    pub model_score_high: f64,
    pub model_score_medium: f64,
    /// Share of anomalous observations that raises a finding
    pub anomaly_share: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            on_time_delivery_high: 70.0,
            on_time_delivery_critical: 60.0,
            quality_medium: 80.0,
            quality_high: 70.0,
            financial_high: 50.0,
            financial_critical: 30.0,
            compliance_medium: 80.0,
            compliance_high: 60.0,
            defect_rate: 5.0,
            response_time_hours: 48.0,
            price_variance: 10.0,
            spend_concentration: 0.7,
            model_score_high: 0.7,
            model_score_medium: 0.5,
            anomaly_share: 0.1,
        }
    }
}

/// Top-level analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum number of input records for a batch
    pub min_records: usize,
    /// Field names recognized as the record date, in lookup order
    pub date_fields: Vec<String>,
    /// Numeric fields that are identifiers rather than metrics
    pub ignored_fields: Vec<String>,
    /// Longest history kept after gap filling
    pub max_span_days: usize,
    pub forecast_method: ForecastMethod,
    pub seasonal_period: usize,
    /// z multiplier for default confidence bounds
    pub confidence_z: f64,
    /// Optional ONNX risk model
    pub model_path: Option<PathBuf>,
    pub model_timeout_ms: u64,
    pub priority: PriorityConfig,
    pub thresholds: RuleThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_records: 10,
            date_fields: ["date", "timestamp", "datetime", "recorded_at", "created_at", "period"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_fields: vec!["id".to_string(), "vendor_id".to_string()],
            max_span_days: 3650,
            forecast_method: ForecastMethod::default(),
            seasonal_period: 7,
            confidence_z: 1.96,
            model_path: None,
            model_timeout_ms: 100,
            priority: PriorityConfig::default(),
            thresholds: RuleThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("VRISK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.min_records, 10);
        assert_eq!(config.forecast_method, ForecastMethod::Seasonal);
        assert_eq!(config.priority.decay_exponent, 0.5);
        assert_eq!(config.thresholds.on_time_delivery_high, 70.0);
    }

    #[test]
    fn test_load_from_file_with_partial_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "forecast_method = \"naive\"\n\n[priority]\ndecay_exponent = 1.0"
        )
        .unwrap();

        let config = AnalysisConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.forecast_method, ForecastMethod::Naive);
        assert_eq!(config.priority.decay_exponent, 1.0);
        assert_eq!(config.priority.critical_weight, 4.0);
        assert_eq!(config.seasonal_period, 7);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = AnalysisConfig::load(Some(Path::new("/nonexistent/vrisk.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_forecast_method_parsing() {
        assert_eq!("ARIMA".parse::<ForecastMethod>(), Ok(ForecastMethod::Classical));
        assert_eq!("naive".parse::<ForecastMethod>(), Ok(ForecastMethod::Naive));
        assert!("prophet2".parse::<ForecastMethod>().is_err());
    }

    #[test]
    fn test_config_file_accepts_method_aliases() {
        for (alias, method) in [
            ("arima", ForecastMethod::Classical),
            ("advanced", ForecastMethod::Seasonal),
            ("linear", ForecastMethod::Naive),
        ] {
            let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            writeln!(file, "forecast_method = \"{alias}\"").unwrap();
            let config = AnalysisConfig::load(Some(file.path())).unwrap();
            assert_eq!(config.forecast_method, method);
        }
    }
}

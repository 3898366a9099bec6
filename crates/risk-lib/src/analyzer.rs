//! Vendor time-series analysis entry point
//!
//! Runs the per-metric pipeline (trend, seasonality, anomalies, change
//! points, forecast) for every metric of a vendor history, then merges the
//! results into a prioritized risk assessment.

use crate::analysis::{
    AnomalyDetector, ChangePointDetector, SeasonalityDetector, TrendEstimator, MIN_ANOMALY_POINTS,
    MIN_CHANGE_POINTS, MIN_SEASONAL_POINTS,
};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::forecast::Forecaster;
use crate::models::{
    AnomalyRecord, AnomalySeverity, ChangePointRecord, DegradedAnalysis, ForecastResult,
    MetricAnalysis, MetricSeries, Record, TrendDirection, VendorAnalysis, VendorMetrics,
};
use crate::observability::{AnalysisMetrics, StructuredLogger};
use crate::risk::{
    lower_is_better, summarize, FallbackRiskModel, MetricOutlook, OnnxRiskModel, RiskEnsemble,
    RiskFeatures, RiskModel, RiskScore, RiskSignals,
};
use crate::series::SeriesPreprocessor;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Output of one metric's pipeline
struct MetricReport {
    analysis: MetricAnalysis,
    anomalies: Vec<AnomalyRecord>,
    change_points: Vec<ChangePointRecord>,
    outlook: Option<MetricOutlook>,
    degraded: Vec<DegradedAnalysis>,
}

/// Analyzes vendor histories
pub struct TimeSeriesAnalyzer {
    config: AnalysisConfig,
    trend: TrendEstimator,
    seasonality: SeasonalityDetector,
    anomalies: AnomalyDetector,
    change_points: ChangePointDetector,
    forecaster: Forecaster,
    ensemble: RiskEnsemble,
    model: Arc<dyn RiskModel>,
    model_timeout: Duration,
    anchor: Option<DateTime<Utc>>,
    metrics: AnalysisMetrics,
    logger: StructuredLogger,
}

impl TimeSeriesAnalyzer {
    /// Build an analyzer; a model that fails to load is replaced by the heuristic
    pub fn new(config: AnalysisConfig) -> Self {
        let logger = StructuredLogger::new("analyzer");
        let model: Arc<dyn RiskModel> = match &config.model_path {
            Some(path) => match OnnxRiskModel::from_file(path) {
                Ok(model) => {
                    logger.log_model_loaded(model.model_version());
                    Arc::new(model)
                }
                Err(e) => {
                    logger.log_model_fallback("fallback", &format!("{e:#}"));
                    Arc::new(FallbackRiskModel)
                }
            },
            None => Arc::new(FallbackRiskModel),
        };
        Self::with_model(config, model)
    }

    /// Build an analyzer around an already loaded model
    pub fn with_model(config: AnalysisConfig, model: Arc<dyn RiskModel>) -> Self {
        let metrics = AnalysisMetrics::new();
        metrics.set_model_version(model.model_version());
        Self {
            trend: TrendEstimator::default(),
            seasonality: SeasonalityDetector::new(config.seasonal_period),
            anomalies: AnomalyDetector::default(),
            change_points: ChangePointDetector::default(),
            forecaster: Forecaster::new(
                config.forecast_method,
                config.seasonal_period,
                config.confidence_z,
            ),
            ensemble: RiskEnsemble::new(config.thresholds.clone(), config.priority.clone()),
            model_timeout: Duration::from_millis(config.model_timeout_ms),
            model,
            anchor: None,
            metrics,
            logger: StructuredLogger::new("analyzer"),
            config,
        }
    }

    /// Fix the day synthesized timestamps end on
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn model_version(&self) -> &str {
        self.model.model_version()
    }

    fn preprocess(&self, records: &[Record]) -> Result<Vec<MetricSeries>> {
        let preprocessor = SeriesPreprocessor::new(&self.config);
        match self.anchor {
            Some(anchor) => preprocessor.with_anchor(anchor).process(records),
            None => preprocessor.process(records),
        }
    }

    /// Analyze one vendor history.
    ///
    /// `current` overrides the current metric values; missing fields default
    /// to the last observation of the matching series.
    pub async fn analyze(
        &self,
        records: &[Record],
        horizon_days: usize,
        current: Option<VendorMetrics>,
    ) -> Result<VendorAnalysis> {
        let start = Instant::now();
        let vendor = vendor_label(records);
        self.logger
            .log_analysis_started(&vendor, records.len(), horizon_days);

        let result = self.run(records, horizon_days, current).await;

        self.metrics
            .observe_analysis_latency(start.elapsed().as_secs_f64());
        match &result {
            Ok(analysis) => {
                self.metrics.inc_analyses("ok");
                self.logger.log_analysis_completed(
                    &vendor,
                    analysis.metrics_analysis.len(),
                    analysis.anomalies.len(),
                    analysis.change_points.len(),
                    analysis.risk_findings.len(),
                    analysis.degraded.len(),
                    start.elapsed().as_millis(),
                );
            }
            Err(e) => {
                self.metrics.inc_analyses("error");
                self.logger.log_analysis_failed(&vendor, &e.to_string());
            }
        }
        result
    }

    async fn run(
        &self,
        records: &[Record],
        horizon_days: usize,
        current: Option<VendorMetrics>,
    ) -> Result<VendorAnalysis> {
        if horizon_days == 0 {
            return Err(AnalysisError::InvalidHorizon(horizon_days));
        }
        let series = self.preprocess(records)?;

        let mut metrics_analysis = BTreeMap::new();
        let mut anomalies = Vec::new();
        let mut change_points = Vec::new();
        let mut outlooks = Vec::new();
        let mut degraded = Vec::new();
        for s in &series {
            let report = self.analyze_metric(s, horizon_days);
            metrics_analysis.insert(s.name().to_string(), report.analysis);
            anomalies.extend(report.anomalies);
            change_points.extend(report.change_points);
            outlooks.extend(report.outlook);
            degraded.extend(report.degraded);
        }

        let (risk_trend, predictions) = summarize(&outlooks, horizon_days);

        let observations: usize = series.iter().map(MetricSeries::len).sum();
        let anomaly_share = if observations == 0 {
            0.0
        } else {
            anomalies.len() as f64 / observations as f64
        };
        let high_severity_anomalies = anomalies
            .iter()
            .filter(|a| a.severity == AnomalySeverity::High)
            .count();

        let current = current
            .unwrap_or_default()
            .or(VendorMetrics::from_series(&series));
        let features = RiskFeatures::from_signals(
            &current,
            adverse_trend(&metrics_analysis),
            anomaly_share,
        );
        let model_score = self.score_model(features).await;

        let risk_findings = self.ensemble.assess(&RiskSignals {
            metrics: &current,
            risk_trend,
            predictions,
            model_score: Some(model_score),
            anomaly_share,
            high_severity_anomalies,
        });

        self.metrics.add_anomalies(anomalies.len());
        self.metrics.add_change_points(change_points.len());

        Ok(VendorAnalysis {
            metrics_analysis,
            anomalies,
            change_points,
            predictions,
            risk_trend,
            risk_findings,
            degraded,
            generated_at: Utc::now().timestamp(),
        })
    }

    fn degrade(&self, metric: &str, analysis: &str, error: &AnalysisError) -> DegradedAnalysis {
        self.metrics.inc_degraded(analysis);
        self.logger.log_degraded(metric, analysis, &error.to_string());
        DegradedAnalysis {
            metric: metric.to_string(),
            analysis: analysis.to_string(),
            reason: error.to_string(),
        }
    }

    fn analyze_metric(&self, series: &MetricSeries, horizon_days: usize) -> MetricReport {
        let name = series.name();
        let n = series.len();
        let mut degraded = Vec::new();

        let trend = self.trend.estimate(series);

        let seasonality = match self.seasonality.try_detect(series) {
            Ok(result) => Some(result),
            Err(e @ AnalysisError::InsufficientData { .. }) => {
                debug!(metric = %name, points = n, min = MIN_SEASONAL_POINTS + 1, "Seasonality skipped");
                degraded.push(self.degrade(name, "seasonality", &e));
                None
            }
            Err(e) => {
                degraded.push(self.degrade(name, "seasonality", &e));
                Some(self.seasonality.detect(series))
            }
        };

        let anomalies = if n < MIN_ANOMALY_POINTS {
            degraded.push(self.degrade(
                name,
                "anomalies",
                &AnalysisError::insufficient(MIN_ANOMALY_POINTS, n),
            ));
            Vec::new()
        } else {
            self.anomalies.detect(series)
        };

        let change_points = if n < MIN_CHANGE_POINTS {
            degraded.push(self.degrade(
                name,
                "change_points",
                &AnalysisError::insufficient(MIN_CHANGE_POINTS, n),
            ));
            Vec::new()
        } else {
            self.change_points.detect(series)
        };

        let forecast = match self.forecaster.forecast_with_fallbacks(series, horizon_days) {
            Ok((forecast, fallbacks)) => {
                for fallback in &fallbacks {
                    self.metrics.inc_forecast_fallback(fallback.strategy);
                    self.logger
                        .log_forecast_fallback(name, fallback.strategy, &fallback.error.to_string());
                }
                Some(forecast)
            }
            Err(e) => {
                degraded.push(self.degrade(name, "forecast", &e));
                None
            }
        };

        let current_value = series.last().map(|(_, v)| v).unwrap_or_default();
        let outlook = forecast
            .as_ref()
            .map(|f| MetricOutlook::new(name, current_value, f));

        MetricReport {
            analysis: MetricAnalysis {
                current_value,
                mean: series.mean(),
                trend,
                seasonality,
                forecast,
            },
            anomalies,
            change_points,
            outlook,
            degraded,
        }
    }

    /// Score with the risk model under the configured timeout, falling back
    /// to the heuristic on error or timeout
    async fn score_model(&self, features: RiskFeatures) -> RiskScore {
        let model = Arc::clone(&self.model);
        let input = features.clone();
        let task = tokio::task::spawn_blocking(move || model.score(&input));

        let reason = match tokio::time::timeout(self.model_timeout, task).await {
            Ok(Ok(Ok(score))) if score.score.is_finite() && score.confidence.is_finite() => {
                return score
            }
            Ok(Ok(Ok(_))) => "model returned a non-finite score".to_string(),
            Ok(Ok(Err(e))) => format!("inference failed: {e:#}"),
            Ok(Err(e)) => format!("inference task failed: {e}"),
            Err(_) => format!("inference exceeded {}ms", self.model_timeout.as_millis()),
        };

        warn!(reason = %reason, "Using fallback risk score");
        self.metrics.inc_model_fallbacks();
        self.logger
            .log_model_fallback(self.model.model_version(), &reason);
        FallbackRiskModel::predict(&features)
    }

    /// Forecast a single metric of a vendor history
    pub fn forecast_metric(
        &self,
        records: &[Record],
        metric: &str,
        horizon_days: usize,
    ) -> Result<ForecastResult> {
        if horizon_days == 0 {
            return Err(AnalysisError::InvalidHorizon(horizon_days));
        }
        let series = self.preprocess(records)?;
        let target = series
            .iter()
            .find(|s| s.name() == metric)
            .ok_or_else(|| AnalysisError::UnknownMetric(metric.to_string()))?;
        self.forecaster.forecast(target, horizon_days)
    }

    /// Analyze many vendors concurrently, each with its optional current
    /// metrics; results keep the input order
    pub async fn analyze_many(
        self: &Arc<Self>,
        batches: Vec<(Vec<Record>, Option<VendorMetrics>)>,
        horizon_days: usize,
    ) -> Vec<Result<VendorAnalysis>> {
        let total = batches.len();
        let mut set = JoinSet::new();
        for (index, (records, current)) in batches.into_iter().enumerate() {
            let analyzer = Arc::clone(self);
            set.spawn(async move {
                let result = analyzer.analyze(&records, horizon_days, current).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<VendorAnalysis>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!(error = %e, "Vendor analysis task failed"),
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or(Err(AnalysisError::Decomposition("analysis task aborted".to_string()))))
            .collect()
    }
}

impl Default for TimeSeriesAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

/// Vendor identifier for logs, taken from the first record
fn vendor_label(records: &[Record]) -> String {
    records
        .first()
        .and_then(|r| r.get("vendor_id").or_else(|| r.get("vendor")))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Mean slope against each metric's good direction, counting only adverse moves
fn adverse_trend(metrics: &BTreeMap<String, MetricAnalysis>) -> f64 {
    let slopes: Vec<f64> = metrics
        .iter()
        .filter(|(_, m)| m.trend.direction != TrendDirection::InsufficientData)
        .map(|(name, m)| {
            let signed = if lower_is_better(name) {
                -m.trend.normalized_slope
            } else {
                m.trend.normalized_slope
            };
            (-signed).max(0.0)
        })
        .collect();
    if slopes.is_empty() {
        0.0
    } else {
        slopes.iter().sum::<f64>() / slopes.len() as f64
    }
}

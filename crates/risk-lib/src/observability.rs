//! Observability for vendor analyses
//!
//! Provides:
//! - Prometheus metrics (analysis latency, detections, degraded sub-analyses, fallbacks)
//! - Structured logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for analysis latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance; `None` when registration failed
static GLOBAL_METRICS: OnceLock<Option<AnalysisMetricsInner>> = OnceLock::new();

struct AnalysisMetricsInner {
    analysis_latency_seconds: Histogram,
    analyses: IntCounterVec,
    anomalies_detected: IntCounter,
    change_points_detected: IntCounter,
    degraded_analyses: IntCounterVec,
    forecast_fallbacks: IntCounterVec,
    model_fallbacks: IntCounter,
    model_version_info: GaugeVec,
}

impl AnalysisMetricsInner {
    fn register() -> prometheus::Result<Self> {
        Ok(Self {
            analysis_latency_seconds: register_histogram!(
                "vendor_risk_analysis_latency_seconds",
                "Time spent analyzing one vendor history",
                LATENCY_BUCKETS.to_vec()
            )?,
            analyses: register_int_counter_vec!(
                "vendor_risk_analyses_total",
                "Vendor analyses by outcome",
                &["outcome"]
            )?,
            anomalies_detected: register_int_counter!(
                "vendor_risk_anomalies_detected_total",
                "Total number of anomalous observations"
            )?,
            change_points_detected: register_int_counter!(
                "vendor_risk_change_points_detected_total",
                "Total number of detected mean shifts"
            )?,
            degraded_analyses: register_int_counter_vec!(
                "vendor_risk_degraded_analyses_total",
                "Sub-analyses skipped or downgraded",
                &["analysis"]
            )?,
            forecast_fallbacks: register_int_counter_vec!(
                "vendor_risk_forecast_fallbacks_total",
                "Forecasting strategies that failed and handed over",
                &["strategy"]
            )?,
            model_fallbacks: register_int_counter!(
                "vendor_risk_model_fallbacks_total",
                "Model scores replaced by the heuristic"
            )?,
            model_version_info: register_gauge_vec!(
                "vendor_risk_model_version_info",
                "Information about the loaded risk model",
                &["version"]
            )?,
        })
    }
}

/// Analysis metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance. Clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct AnalysisMetrics {
    _private: (),
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisMetrics {
    /// Create a metrics handle, registering the global metrics on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(|| match AnalysisMetricsInner::register() {
            Ok(inner) => Some(inner),
            Err(e) => {
                warn!(error = %e, "Failed to register analysis metrics");
                None
            }
        });
        Self { _private: () }
    }

    fn inner(&self) -> Option<&AnalysisMetricsInner> {
        GLOBAL_METRICS.get().and_then(|m| m.as_ref())
    }

    pub fn observe_analysis_latency(&self, duration_secs: f64) {
        if let Some(m) = self.inner() {
            m.analysis_latency_seconds.observe(duration_secs);
        }
    }

    /// Count a finished analysis; `outcome` is `ok` or `error`
    pub fn inc_analyses(&self, outcome: &str) {
        if let Some(m) = self.inner() {
            m.analyses.with_label_values(&[outcome]).inc();
        }
    }

    pub fn add_anomalies(&self, count: usize) {
        if let Some(m) = self.inner() {
            m.anomalies_detected.inc_by(count as u64);
        }
    }

    pub fn add_change_points(&self, count: usize) {
        if let Some(m) = self.inner() {
            m.change_points_detected.inc_by(count as u64);
        }
    }

    pub fn inc_degraded(&self, analysis: &str) {
        if let Some(m) = self.inner() {
            m.degraded_analyses.with_label_values(&[analysis]).inc();
        }
    }

    pub fn inc_forecast_fallback(&self, strategy: &str) {
        if let Some(m) = self.inner() {
            m.forecast_fallbacks.with_label_values(&[strategy]).inc();
        }
    }

    pub fn inc_model_fallbacks(&self) {
        if let Some(m) = self.inner() {
            m.model_fallbacks.inc();
        }
    }

    /// Record the active model version
    pub fn set_model_version(&self, version: &str) {
        if let Some(m) = self.inner() {
            m.model_version_info.reset();
            m.model_version_info.with_label_values(&[version]).set(1.0);
        }
    }
}

/// Structured logger for analysis lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn log_analysis_started(&self, vendor: &str, records: usize, horizon_days: usize) {
        debug!(
            event = "analysis_started",
            component = %self.component,
            vendor = %vendor,
            records = records,
            horizon_days = horizon_days,
            "Starting vendor analysis"
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_analysis_completed(
        &self,
        vendor: &str,
        metrics: usize,
        anomalies: usize,
        change_points: usize,
        findings: usize,
        degraded: usize,
        elapsed_ms: u128,
    ) {
        info!(
            event = "analysis_completed",
            component = %self.component,
            vendor = %vendor,
            metrics = metrics,
            anomalies = anomalies,
            change_points = change_points,
            findings = findings,
            degraded = degraded,
            elapsed_ms = elapsed_ms,
            "Vendor analysis completed"
        );
    }

    pub fn log_analysis_failed(&self, vendor: &str, error: &str) {
        warn!(
            event = "analysis_failed",
            component = %self.component,
            vendor = %vendor,
            error = %error,
            "Vendor analysis failed"
        );
    }

    /// Log a sub-analysis that was skipped or downgraded
    pub fn log_degraded(&self, metric: &str, analysis: &str, reason: &str) {
        warn!(
            event = "analysis_degraded",
            component = %self.component,
            metric = %metric,
            analysis = %analysis,
            reason = %reason,
            "Sub-analysis degraded"
        );
    }

    pub fn log_forecast_fallback(&self, metric: &str, strategy: &str, error: &str) {
        info!(
            event = "forecast_fallback",
            component = %self.component,
            metric = %metric,
            strategy = %strategy,
            error = %error,
            "Forecasting strategy failed, used next tier"
        );
    }

    pub fn log_model_fallback(&self, model_version: &str, reason: &str) {
        warn!(
            event = "model_fallback",
            component = %self.component,
            model_version = %model_version,
            reason = %reason,
            "Risk model unavailable, using heuristic score"
        );
    }

    pub fn log_model_loaded(&self, model_version: &str) {
        info!(
            event = "model_loaded",
            component = %self.component,
            model_version = %model_version,
            "Risk model loaded"
        );
    }
}

//! Vendor risk scoring
//!
//! Scores a fixed feature vector in [0, 1] with an ONNX model loaded via
//! tract-onnx, or with a weighted heuristic when no model is available.

use crate::models::VendorMetrics;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Number of input features expected by the model
pub const NUM_FEATURES: usize = 10;

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

/// Confidence reported by the heuristic at full feature coverage
const HEURISTIC_CONFIDENCE: f64 = 0.6;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Model input, each feature scaled to roughly [0, 1] with 1 meaning risky.
/// Missing metrics stay `None` and are imputed as neutral for the tensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskFeatures {
    pub delivery_shortfall: Option<f32>,
    pub quality_shortfall: Option<f32>,
    pub financial_weakness: Option<f32>,
    pub compliance_shortfall: Option<f32>,
    pub defect_rate: Option<f32>,
    pub response_delay: Option<f32>,
    pub price_volatility: Option<f32>,
    pub spend_concentration: Option<f32>,
    /// Mean adverse trend slope across metrics
    pub adverse_trend: f32,
    /// Share of observations flagged anomalous
    pub anomaly_share: f32,
}

fn unit(value: f64) -> f32 {
    value.clamp(0.0, 1.0) as f32
}

impl RiskFeatures {
    /// Scale current metrics and history signals into model features
    pub fn from_signals(metrics: &VendorMetrics, adverse_trend: f64, anomaly_share: f64) -> Self {
        Self {
            delivery_shortfall: metrics.on_time_delivery.map(|v| unit(1.0 - v / 100.0)),
            quality_shortfall: metrics.quality_score.map(|v| unit(1.0 - v / 100.0)),
            financial_weakness: metrics.financial_health_score.map(|v| unit(1.0 - v / 100.0)),
            compliance_shortfall: metrics.compliance_score.map(|v| unit(1.0 - v / 100.0)),
            defect_rate: metrics.defect_rate.map(|v| unit(v / 10.0)),
            response_delay: metrics.response_time_hours.map(|v| unit(v / 168.0)),
            price_volatility: metrics.price_variance.map(|v| unit(v.abs() / 25.0)),
            spend_concentration: metrics.spend_concentration.map(unit),
            adverse_trend: unit(adverse_trend * 10.0),
            anomaly_share: unit(anomaly_share),
        }
    }

    fn optional(&self) -> [Option<f32>; 8] {
        [
            self.delivery_shortfall,
            self.quality_shortfall,
            self.financial_weakness,
            self.compliance_shortfall,
            self.defect_rate,
            self.response_delay,
            self.price_volatility,
            self.spend_concentration,
        ]
    }

    /// Dense input row with missing features imputed as 0 (no risk evidence)
    pub fn to_row(&self) -> [f32; NUM_FEATURES] {
        let mut row = [0.0; NUM_FEATURES];
        for (slot, value) in row.iter_mut().zip(self.optional()) {
            *slot = value.unwrap_or(0.0);
        }
        row[8] = self.adverse_trend;
        row[9] = self.anomaly_share;
        row
    }
}

/// Model risk score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskScore {
    /// Probability-like risk in [0, 1]
    pub score: f64,
    pub confidence: f64,
    pub model_version: String,
}

/// Trait for risk model implementations
pub trait RiskModel: Send + Sync {
    /// Score a feature vector
    fn score(&self, features: &RiskFeatures) -> Result<RiskScore>;

    /// Get the model version
    fn model_version(&self) -> &str;
}

/// ONNX-based risk model using tract for lightweight inference
pub struct OnnxRiskModel {
    model: TractModel,
    version: String,
}

impl OnnxRiskModel {
    /// Create a model from ONNX bytes
    pub fn new(model_bytes: &[u8], version: impl Into<String>) -> Result<Self> {
        Ok(Self {
            model: Self::load_model(model_bytes)?,
            version: version.into(),
        })
    }

    /// Load a model file; the file stem becomes the model version
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        let version = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());
        Self::new(&bytes, version)
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn features_to_tensor(features: &RiskFeatures) -> Result<Tensor> {
        let row = features.to_row().to_vec();
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), row)
            .context("Failed to shape feature tensor")?;
        Ok(array.into())
    }

    /// Read `[score]` or `[score, confidence]` from the output tensor
    fn tensor_to_score(output: &Tensor, version: &str) -> Result<RiskScore> {
        let view = output.to_array_view::<f32>()?;
        let values: Vec<f32> = view.iter().copied().collect();
        let score = *values.first().context("Model output is empty")?;
        let confidence = values.get(1).copied().unwrap_or(0.8);
        if !score.is_finite() {
            anyhow::bail!("Model produced a non-finite score");
        }
        if !confidence.is_finite() {
            anyhow::bail!("Model produced a non-finite confidence");
        }
        Ok(RiskScore {
            score: (score as f64).clamp(0.0, 1.0),
            confidence: (confidence as f64).clamp(0.0, 1.0),
            model_version: version.to_string(),
        })
    }
}

impl RiskModel for OnnxRiskModel {
    fn score(&self, features: &RiskFeatures) -> Result<RiskScore> {
        let start = Instant::now();
        let input = Self::features_to_tensor(features)?;

        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Self::tensor_to_score(output, &self.version)
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

/// Weighted heuristic used when no model is loaded or the model fails
#[derive(Debug, Clone, Default)]
pub struct FallbackRiskModel;

/// Heuristic weight per entry of `RiskFeatures::optional`
const FEATURE_WEIGHTS: [f64; 8] = [0.25, 0.15, 0.2, 0.1, 0.1, 0.05, 0.05, 0.1];

const TREND_WEIGHT: f64 = 0.15;
const ANOMALY_WEIGHT: f64 = 0.1;

impl FallbackRiskModel {
    pub fn predict(features: &RiskFeatures) -> RiskScore {
        let total_weight: f64 =
            FEATURE_WEIGHTS.iter().sum::<f64>() + TREND_WEIGHT + ANOMALY_WEIGHT;

        let mut weight = TREND_WEIGHT + ANOMALY_WEIGHT;
        let mut weighted = TREND_WEIGHT * features.adverse_trend as f64
            + ANOMALY_WEIGHT * features.anomaly_share as f64;
        for (value, w) in features.optional().iter().zip(FEATURE_WEIGHTS) {
            if let Some(v) = value {
                weight += w;
                weighted += w * *v as f64;
            }
        }

        RiskScore {
            score: (weighted / weight).clamp(0.0, 1.0),
            confidence: HEURISTIC_CONFIDENCE * weight / total_weight,
            model_version: "fallback".to_string(),
        }
    }
}

impl RiskModel for FallbackRiskModel {
    fn score(&self, features: &RiskFeatures) -> Result<RiskScore> {
        Ok(Self::predict(features))
    }

    fn model_version(&self) -> &str {
        "fallback"
    }
}

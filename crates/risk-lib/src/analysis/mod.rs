//! Per-metric detectors
//!
//! This module provides:
//! - Trend classification (OLS slope relative to the series level)
//! - Weekly seasonality via additive decomposition
//! - IQR-based anomaly flagging
//! - Rolling-window change point detection
//!
//! Each detector works on a single metric; there is no cross-metric correlation.

mod anomaly;
mod change_point;
mod seasonality;
mod trend;

pub use anomaly::{AnomalyDetector, MIN_ANOMALY_POINTS};
pub use change_point::{ChangePointDetector, MIN_CHANGE_POINTS};
pub use seasonality::{decompose, Decomposition, SeasonalityDetector, MIN_SEASONAL_POINTS};
pub use trend::{TrendEstimator, MIN_TREND_POINTS};

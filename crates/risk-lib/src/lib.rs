//! Vendor risk time-series library
//!
//! This crate provides the core functionality for:
//! - Preprocessing vendor history records into daily metric series
//! - Trend, seasonality, anomaly and change point detection
//! - Multi-tier forecasting with confidence bounds
//! - Rule, trend and model based risk assessment
//! - Prometheus metrics and structured logging

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod observability;
pub mod risk;
pub mod series;

pub use analyzer::TimeSeriesAnalyzer;
pub use config::{AnalysisConfig, ForecastMethod, PriorityConfig, RuleThresholds};
pub use error::{AnalysisError, Result};
pub use models::*;
pub use observability::{AnalysisMetrics, StructuredLogger};

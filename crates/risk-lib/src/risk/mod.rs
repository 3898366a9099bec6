//! Vendor risk assessment
//!
//! Hard-threshold rules, forecast outlook, model scoring and the ensemble
//! that merges and prioritizes their findings.

mod ensemble;
mod model;
mod outlook;
mod rules;

pub use ensemble::{RiskEnsemble, RiskSignals};
pub use model::{
    FallbackRiskModel, OnnxRiskModel, RiskFeatures, RiskModel, RiskScore, NUM_FEATURES,
};
pub use outlook::{lower_is_better, summarize, MetricOutlook, CHANGE_THRESHOLD};
pub use rules::evaluate_rules;

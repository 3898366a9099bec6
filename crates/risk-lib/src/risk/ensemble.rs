//! Risk ensemble
//!
//! Merges rule findings, the aggregate forecast trend, the model score and
//! the anomaly rate, then orders findings by priority.

use super::model::RiskScore;
use super::rules::evaluate_rules;
use crate::config::{PriorityConfig, RuleThresholds};
use crate::models::{Predictions, RiskFinding, RiskLevel, RiskTrend, VendorMetrics};

/// Everything the ensemble weighs for one vendor
#[derive(Debug, Clone)]
pub struct RiskSignals<'a> {
    pub metrics: &'a VendorMetrics,
    pub risk_trend: RiskTrend,
    pub predictions: Predictions,
    pub model_score: Option<RiskScore>,
    /// Share of all observations flagged anomalous
    pub anomaly_share: f64,
    pub high_severity_anomalies: usize,
}

pub struct RiskEnsemble {
    thresholds: RuleThresholds,
    priority: PriorityConfig,
}

impl RiskEnsemble {
    pub fn new(thresholds: RuleThresholds, priority: PriorityConfig) -> Self {
        Self {
            thresholds,
            priority,
        }
    }

    /// Produce all findings, highest priority first
    pub fn assess(&self, signals: &RiskSignals<'_>) -> Vec<RiskFinding> {
        let mut findings = evaluate_rules(signals.metrics, &self.thresholds);

        if let Some(finding) = trend_finding(signals) {
            findings.push(finding);
        }
        if let Some(score) = &signals.model_score {
            if let Some(finding) = self.model_finding(score) {
                findings.push(finding);
            }
        }
        if let Some(finding) = self.anomaly_finding(signals) {
            findings.push(finding);
        }

        self.prioritize(findings)
    }

    fn model_finding(&self, score: &RiskScore) -> Option<RiskFinding> {
        let level = if score.score >= self.thresholds.model_score_high {
            RiskLevel::High
        } else if score.score >= self.thresholds.model_score_medium {
            RiskLevel::Medium
        } else {
            return None;
        };
        Some(RiskFinding {
            level,
            category: "predicted_risk".to_string(),
            description: format!(
                "Risk model ({}) scores this vendor at {:.2}",
                score.model_version, score.score
            ),
            impact: "Elevated likelihood of supply disruption".to_string(),
            likelihood: score.score,
            confidence: score.confidence,
            time_to_impact_days: 30,
            mitigation_strategies: vec![
                "Review the vendor in the next risk committee".to_string(),
                "Validate the drivers behind the score with the category owner".to_string(),
            ],
        })
    }

    fn anomaly_finding(&self, signals: &RiskSignals<'_>) -> Option<RiskFinding> {
        let share = signals.anomaly_share;
        if share <= self.thresholds.anomaly_share {
            return None;
        }
        let level = if signals.high_severity_anomalies > 0 && share > 2.0 * self.thresholds.anomaly_share {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };
        Some(RiskFinding {
            level,
            category: "anomalous_behavior".to_string(),
            description: format!("{:.0}% of observations fall outside expected ranges", share * 100.0),
            impact: "Unpredictable performance and planning errors".to_string(),
            likelihood: (0.5 + share).min(0.95),
            confidence: 0.6,
            time_to_impact_days: 14,
            mitigation_strategies: vec![
                "Investigate the flagged periods with the vendor".to_string(),
                "Increase monitoring frequency".to_string(),
            ],
        })
    }

    /// Severity-weighted confidence, discounted by time to impact
    fn priority(&self, finding: &RiskFinding) -> f64 {
        let weight = match finding.level {
            RiskLevel::Critical => self.priority.critical_weight,
            RiskLevel::High => self.priority.high_weight,
            RiskLevel::Medium => self.priority.medium_weight,
            RiskLevel::Low => self.priority.low_weight,
        };
        let days = finding.time_to_impact_days.max(1) as f64;
        let priority = weight * finding.confidence / days.powf(self.priority.decay_exponent);
        // A non-finite confidence carries no evidence
        if priority.is_finite() {
            priority
        } else {
            0.0
        }
    }

    /// Stable descending sort by priority
    pub fn prioritize(&self, findings: Vec<RiskFinding>) -> Vec<RiskFinding> {
        let mut scored: Vec<(f64, RiskFinding)> =
            findings.into_iter().map(|f| (self.priority(&f), f)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, f)| f).collect()
    }
}

impl Default for RiskEnsemble {
    fn default() -> Self {
        Self::new(RuleThresholds::default(), PriorityConfig::default())
    }
}

fn trend_finding(signals: &RiskSignals<'_>) -> Option<RiskFinding> {
    if signals.risk_trend != RiskTrend::Deteriorating {
        return None;
    }
    let predictions = &signals.predictions;
    let level = if predictions.risk_level >= RiskLevel::High {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };
    Some(RiskFinding {
        level,
        category: "risk_trend".to_string(),
        description: format!(
            "Forecasts point to deteriorating performance over the next {} days",
            predictions.horizon_days
        ),
        impact: "Gradual erosion of supply reliability".to_string(),
        likelihood: predictions.confidence,
        confidence: predictions.confidence,
        time_to_impact_days: predictions.horizon_days.clamp(1, u32::MAX as usize) as u32,
        mitigation_strategies: vec![
            "Set up a joint improvement plan".to_string(),
            "Track the affected metrics weekly".to_string(),
        ],
    })
}

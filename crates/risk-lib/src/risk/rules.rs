//! Hard-threshold checks on current vendor metrics

use crate::config::RuleThresholds;
use crate::models::{RiskFinding, RiskLevel, VendorMetrics};

fn strategies(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Likelihood grows with the distance past the threshold
fn likelihood(distance: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.6;
    }
    (0.6 + distance.abs() / scale).clamp(0.0, 0.95)
}

/// Evaluate every rule whose metric is present
pub fn evaluate_rules(metrics: &VendorMetrics, t: &RuleThresholds) -> Vec<RiskFinding> {
    let mut findings = Vec::new();

    if let Some(otd) = metrics.on_time_delivery {
        if otd < t.on_time_delivery_high {
            let critical = otd < t.on_time_delivery_critical;
            findings.push(RiskFinding {
                level: if critical { RiskLevel::Critical } else { RiskLevel::High },
                category: "performance_decline".to_string(),
                description: format!(
                    "On-time delivery at {otd:.1}% is below the {:.0}% threshold",
                    t.on_time_delivery_high
                ),
                impact: "Production delays and stock-outs on dependent items".to_string(),
                likelihood: likelihood(t.on_time_delivery_high - otd, t.on_time_delivery_high),
                confidence: 0.85,
                time_to_impact_days: if critical { 7 } else { 14 },
                mitigation_strategies: strategies(&[
                    "Schedule a performance review with the vendor",
                    "Qualify backup suppliers for critical items",
                    "Add delivery service levels with penalties to the contract",
                ]),
            });
        }
    }

    if let Some(quality) = metrics.quality_score {
        if quality < t.quality_medium {
            let high = quality < t.quality_high;
            findings.push(RiskFinding {
                level: if high { RiskLevel::High } else { RiskLevel::Medium },
                category: "quality_degradation".to_string(),
                description: format!(
                    "Quality score {quality:.1} is below the {:.0} threshold",
                    t.quality_medium
                ),
                impact: "Rework, returns and customer-facing defects".to_string(),
                likelihood: likelihood(t.quality_medium - quality, t.quality_medium),
                confidence: 0.8,
                time_to_impact_days: if high { 21 } else { 30 },
                mitigation_strategies: strategies(&[
                    "Increase incoming inspection sampling",
                    "Request a corrective action plan",
                    "Run a supplier quality audit",
                ]),
            });
        }
    }

    if let Some(financial) = metrics.financial_health_score {
        if financial < t.financial_high {
            let critical = financial < t.financial_critical;
            findings.push(RiskFinding {
                level: if critical { RiskLevel::Critical } else { RiskLevel::High },
                category: "financial_instability".to_string(),
                description: format!(
                    "Financial health score {financial:.1} is below the {:.0} threshold",
                    t.financial_high
                ),
                impact: "Possible supply interruption from vendor insolvency".to_string(),
                likelihood: likelihood(t.financial_high - financial, t.financial_high),
                confidence: 0.75,
                time_to_impact_days: if critical { 30 } else { 60 },
                mitigation_strategies: strategies(&[
                    "Monitor credit ratings and payment behaviour",
                    "Reduce prepayments and open purchase orders",
                    "Develop alternative sources",
                ]),
            });
        }
    }

    if let Some(compliance) = metrics.compliance_score {
        if compliance < t.compliance_medium {
            let high = compliance < t.compliance_high;
            findings.push(RiskFinding {
                level: if high { RiskLevel::High } else { RiskLevel::Medium },
                category: "compliance_gap".to_string(),
                description: format!(
                    "Compliance score {compliance:.1} is below the {:.0} threshold",
                    t.compliance_medium
                ),
                impact: "Regulatory exposure and audit findings".to_string(),
                likelihood: likelihood(t.compliance_medium - compliance, t.compliance_medium),
                confidence: 0.8,
                time_to_impact_days: 30,
                mitigation_strategies: strategies(&[
                    "Request updated certifications",
                    "Schedule a compliance audit",
                ]),
            });
        }
    }

    if let Some(defects) = metrics.defect_rate {
        if defects > t.defect_rate {
            let high = defects > 2.0 * t.defect_rate;
            findings.push(RiskFinding {
                level: if high { RiskLevel::High } else { RiskLevel::Medium },
                category: "quality_degradation".to_string(),
                description: format!(
                    "Defect rate {defects:.1}% exceeds the {:.1}% limit",
                    t.defect_rate
                ),
                impact: "Scrap and warranty costs".to_string(),
                likelihood: likelihood(defects - t.defect_rate, 2.0 * t.defect_rate),
                confidence: 0.8,
                time_to_impact_days: 21,
                mitigation_strategies: strategies(&[
                    "Tighten acceptance criteria",
                    "Request root cause analysis",
                ]),
            });
        }
    }

    if let Some(hours) = metrics.response_time_hours {
        if hours > t.response_time_hours {
            let high = hours > 2.0 * t.response_time_hours;
            findings.push(RiskFinding {
                level: if high { RiskLevel::High } else { RiskLevel::Medium },
                category: "responsiveness".to_string(),
                description: format!(
                    "Average response time of {hours:.0}h exceeds {:.0}h",
                    t.response_time_hours
                ),
                impact: "Slow escalation handling during disruptions".to_string(),
                likelihood: likelihood(hours - t.response_time_hours, 2.0 * t.response_time_hours),
                confidence: 0.7,
                time_to_impact_days: 30,
                mitigation_strategies: strategies(&[
                    "Agree on escalation contacts",
                    "Add response time targets to the service agreement",
                ]),
            });
        }
    }

    if let Some(variance) = metrics.price_variance {
        if variance.abs() > t.price_variance {
            let high = variance.abs() > 2.0 * t.price_variance;
            findings.push(RiskFinding {
                level: if high { RiskLevel::High } else { RiskLevel::Medium },
                category: "cost_volatility".to_string(),
                description: format!(
                    "Price variance of {variance:.1}% exceeds ±{:.0}%",
                    t.price_variance
                ),
                impact: "Budget overruns on affected categories".to_string(),
                likelihood: likelihood(variance.abs() - t.price_variance, 2.0 * t.price_variance),
                confidence: 0.7,
                time_to_impact_days: 45,
                mitigation_strategies: strategies(&[
                    "Negotiate fixed pricing or index-linked clauses",
                    "Benchmark against alternative quotes",
                ]),
            });
        }
    }

    if let Some(share) = metrics.spend_concentration {
        if share > t.spend_concentration {
            let high = share > (1.0 + t.spend_concentration) / 2.0;
            findings.push(RiskFinding {
                level: if high { RiskLevel::High } else { RiskLevel::Medium },
                category: "supply_dependency".to_string(),
                description: format!(
                    "{:.0}% of category spend is concentrated on this vendor",
                    share * 100.0
                ),
                impact: "Single point of failure in the supply base".to_string(),
                likelihood: likelihood(share - t.spend_concentration, 1.0 - t.spend_concentration),
                confidence: 0.9,
                time_to_impact_days: 90,
                mitigation_strategies: strategies(&[
                    "Dual-source the highest-spend items",
                    "Build safety stock for critical parts",
                ]),
            });
        }
    }

    findings
}

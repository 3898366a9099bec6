//! Single-vendor analysis command

use anyhow::{Context, Result};
use risk_lib::{TimeSeriesAnalyzer, VendorAnalysis};
use std::path::Path;
use tabled::Tabled;

use super::{load_current, load_history};
use crate::output::{
    color_confidence, color_level, color_risk_trend, format_direction, format_value, print_info,
    print_json, print_table, print_warning, OutputFormat,
};

/// Row for the per-metric table
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "Seasonal")]
    seasonal: String,
    #[tabled(rename = "Forecast End")]
    forecast_end: String,
    #[tabled(rename = "Method")]
    method: String,
}

/// Row for the findings table
#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Impact In")]
    time_to_impact: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Row for the anomaly table
#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

/// Analyze one vendor history file
pub async fn run(
    analyzer: &TimeSeriesAnalyzer,
    file: &Path,
    horizon: usize,
    current: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let history = load_history(file)?;
    let explicit = match current {
        Some(path) => Some(load_current(path)?),
        None => history.current.clone(),
    };

    let analysis = analyzer
        .analyze(&history.records, horizon, explicit)
        .await
        .with_context(|| format!("Failed to analyze {}", file.display()))?;

    match format {
        OutputFormat::Json => print_json(&analysis)?,
        OutputFormat::Table => print_report(&history.label, &analysis),
    }
    Ok(())
}

fn print_report(label: &str, analysis: &VendorAnalysis) {
    println!("Vendor: {}", label);
    println!("Risk trend: {}", color_risk_trend(analysis.risk_trend));
    println!(
        "Predicted risk: {} ({} confidence, {} days)\n",
        color_level(analysis.predictions.risk_level),
        color_confidence(analysis.predictions.confidence),
        analysis.predictions.horizon_days
    );

    let metrics: Vec<MetricRow> = analysis
        .metrics_analysis
        .iter()
        .map(|(name, m)| MetricRow {
            metric: name.clone(),
            current: format_value(m.current_value),
            mean: format_value(m.mean),
            trend: format_direction(m.trend.direction),
            seasonal: match &m.seasonality {
                Some(s) if s.seasonal => format!("yes ({:.2})", s.strength),
                Some(_) => "no".to_string(),
                None => "-".to_string(),
            },
            forecast_end: m
                .forecast
                .as_ref()
                .and_then(|f| f.values.last())
                .map(|v| format_value(*v))
                .unwrap_or_else(|| "-".to_string()),
            method: m
                .forecast
                .as_ref()
                .map(|f| f.method.clone())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    print_table(metrics, "No metrics analyzed");

    println!("\nRisk findings:");
    let findings: Vec<FindingRow> = analysis
        .risk_findings
        .iter()
        .map(|f| FindingRow {
            level: color_level(f.level),
            category: f.category.clone(),
            description: f.description.clone(),
            time_to_impact: format!("{}d", f.time_to_impact_days),
            confidence: color_confidence(f.confidence),
        })
        .collect();
    print_table(findings, "No risk findings");

    if !analysis.anomalies.is_empty() {
        println!("\nAnomalies:");
        let anomalies: Vec<AnomalyRow> = analysis
            .anomalies
            .iter()
            .map(|a| AnomalyRow {
                metric: a.metric.clone(),
                date: a.timestamp.format("%Y-%m-%d").to_string(),
                value: format_value(a.value),
                expected: format!(
                    "{} .. {}",
                    format_value(a.expected_range.0),
                    format_value(a.expected_range.1)
                ),
                severity: a.severity.to_string(),
            })
            .collect();
        print_table(anomalies, "No anomalies");
    }

    if !analysis.change_points.is_empty() {
        println!();
        print_info(&format!("{} change points detected", analysis.change_points.len()));
        for c in &analysis.change_points {
            println!(
                "  {} {} {}: {} -> {}",
                c.timestamp.format("%Y-%m-%d"),
                c.metric,
                c.change_type,
                format_value(c.before_value),
                format_value(c.after_value)
            );
        }
    }

    for d in &analysis.degraded {
        print_warning(&format!("{} / {}: {}", d.metric, d.analysis, d.reason));
    }
}

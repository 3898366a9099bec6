//! Concurrent multi-vendor analysis command

use anyhow::Result;
use risk_lib::TimeSeriesAnalyzer;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;

use super::load_history;
use crate::output::{
    color_confidence, color_level, color_risk_trend, print_error, print_json, print_success,
    print_table, OutputFormat,
};

/// Row for batch summary table
#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Metrics")]
    metrics: usize,
    #[tabled(rename = "Risk Trend")]
    risk_trend: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Findings")]
    findings: usize,
    #[tabled(rename = "Top Finding")]
    top_finding: String,
}

/// JSON entry per input file
#[derive(Serialize)]
struct BatchEntry<'a> {
    vendor: &'a str,
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a risk_lib::VendorAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Analyze several vendor files concurrently.
///
/// Returns the number of vendors that failed.
pub async fn run(
    analyzer: Arc<TimeSeriesAnalyzer>,
    files: &[PathBuf],
    horizon: usize,
    format: OutputFormat,
) -> Result<usize> {
    let histories = files
        .iter()
        .map(|f| load_history(f))
        .collect::<Result<Vec<_>>>()?;
    let labels: Vec<String> = histories.iter().map(|h| h.label.clone()).collect();
    let batches = histories
        .into_iter()
        .map(|h| (h.records, h.current))
        .collect();

    let results = analyzer.analyze_many(batches, horizon).await;
    let failed = results.iter().filter(|r| r.is_err()).count();

    match format {
        OutputFormat::Json => {
            let entries: Vec<BatchEntry> = labels
                .iter()
                .zip(files)
                .zip(&results)
                .map(|((vendor, file), result)| BatchEntry {
                    vendor,
                    file: file.display().to_string(),
                    analysis: result.as_ref().ok(),
                    error: result.as_ref().err().map(|e| e.to_string()),
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Table => {
            let mut rows = Vec::new();
            for (vendor, result) in labels.iter().zip(&results) {
                match result {
                    Ok(analysis) => rows.push(BatchRow {
                        vendor: vendor.clone(),
                        metrics: analysis.metrics_analysis.len(),
                        risk_trend: color_risk_trend(analysis.risk_trend),
                        predicted: color_level(analysis.predictions.risk_level),
                        confidence: color_confidence(analysis.predictions.confidence),
                        findings: analysis.risk_findings.len(),
                        top_finding: analysis
                            .risk_findings
                            .first()
                            .map(|f| format!("{} ({})", f.category, f.level))
                            .unwrap_or_else(|| "-".to_string()),
                    }),
                    Err(e) => print_error(&format!("{}: {}", vendor, e)),
                }
            }
            print_table(rows, "No vendors analyzed");
            if failed == 0 {
                print_success(&format!("Analyzed {} vendors", results.len()));
            }
        }
    }

    Ok(failed)
}

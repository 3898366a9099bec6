//! Single-metric forecast command

use anyhow::{Context, Result};
use risk_lib::TimeSeriesAnalyzer;
use std::path::Path;
use tabled::Tabled;

use super::load_history;
use crate::output::{format_value, print_json, print_table, OutputFormat};

/// Row for forecast table
#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Forecast")]
    value: String,
    #[tabled(rename = "Lower")]
    lower: String,
    #[tabled(rename = "Upper")]
    upper: String,
}

/// Forecast one metric of a vendor history file
pub fn run(
    analyzer: &TimeSeriesAnalyzer,
    file: &Path,
    metric: &str,
    horizon: usize,
    format: OutputFormat,
) -> Result<()> {
    let history = load_history(file)?;
    let forecast = analyzer
        .forecast_metric(&history.records, metric, horizon)
        .with_context(|| format!("Failed to forecast '{}' from {}", metric, file.display()))?;

    match format {
        OutputFormat::Json => print_json(&forecast)?,
        OutputFormat::Table => {
            println!("Metric: {} ({})", metric, forecast.method);
            let rows: Vec<ForecastRow> = forecast
                .values
                .iter()
                .zip(&forecast.lower_bound)
                .zip(&forecast.upper_bound)
                .enumerate()
                .map(|(i, ((value, lower), upper))| ForecastRow {
                    day: format!("+{}", i + 1),
                    value: format_value(*value),
                    lower: format_value(*lower),
                    upper: format_value(*upper),
                })
                .collect();
            print_table(rows, "Empty forecast");
        }
    }
    Ok(())
}

//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use risk_lib::{RiskLevel, RiskTrend, TrendDirection};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table, or a notice when there are none
pub fn print_table<T: Tabled>(rows: Vec<T>, empty_message: &str) {
    if rows.is_empty() {
        print_info(empty_message);
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a metric value with two decimals
pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Color a risk level by severity
pub fn color_level(level: RiskLevel) -> String {
    let text = level.to_string();
    match level {
        RiskLevel::Critical => text.red().bold().to_string(),
        RiskLevel::High => text.red().to_string(),
        RiskLevel::Medium => text.yellow().to_string(),
        RiskLevel::Low => text.green().to_string(),
    }
}

/// Color the aggregate risk trend
pub fn color_risk_trend(trend: RiskTrend) -> String {
    let text = trend.to_string();
    match trend {
        RiskTrend::Improving => text.green().to_string(),
        RiskTrend::Deteriorating => text.red().to_string(),
        RiskTrend::Stable => text,
    }
}

/// Arrow plus direction name for a metric trend
pub fn format_direction(direction: TrendDirection) -> String {
    match direction {
        TrendDirection::Increasing => format!("↑ {}", direction),
        TrendDirection::Decreasing => format!("↓ {}", direction),
        TrendDirection::Stable => format!("→ {}", direction),
        TrendDirection::InsufficientData => direction.to_string().dimmed().to_string(),
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

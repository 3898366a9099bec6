//! Vendor risk analysis CLI
//!
//! A command-line driver for analyzing vendor performance histories,
//! forecasting single metrics and batch-scoring many vendors.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, batch, forecast};
use risk_lib::{ForecastMethod, TimeSeriesAnalyzer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Vendor risk time-series analysis
#[derive(Parser)]
#[command(name = "vrisk")]
#[command(author, version, about = "Vendor risk time-series analysis", long_about = None)]
pub struct Cli {
    /// Path to a TOML/JSON/YAML config file (defaults to ~/.config/vrisk/config.toml)
    #[arg(long, env = "VRISK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output (JSON debug logs on stderr)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one vendor history file
    Analyze {
        /// JSON file with an array of records or {vendor_id, records, current}
        file: PathBuf,

        /// Forecast horizon in days
        #[arg(long, default_value_t = 30)]
        horizon: usize,

        /// JSON file with current metric values
        #[arg(long)]
        current: Option<PathBuf>,
    },

    /// Forecast a single metric
    Forecast {
        /// JSON history file
        file: PathBuf,

        /// Metric (column) to forecast
        #[arg(long, short)]
        metric: String,

        /// Forecast horizon in days
        #[arg(long, default_value_t = 30)]
        horizon: usize,

        /// Forecasting method (seasonal, classical, naive)
        #[arg(long)]
        method: Option<ForecastMethod>,
    },

    /// Analyze many vendor files concurrently
    Batch {
        /// JSON history files, one per vendor
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Forecast horizon in days
        #[arg(long, default_value_t = 30)]
        horizon: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    if verbose {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut analysis_config = config::load(cli.config.as_deref())?;
    if let Commands::Forecast {
        method: Some(method),
        ..
    } = &cli.command
    {
        analysis_config.forecast_method = *method;
    }
    debug!(config = ?analysis_config, "Loaded analysis configuration");

    let analyzer = Arc::new(TimeSeriesAnalyzer::new(analysis_config));

    match cli.command {
        Commands::Analyze {
            file,
            horizon,
            current,
        } => {
            analyze::run(&analyzer, &file, horizon, current.as_deref(), cli.format).await?;
        }
        Commands::Forecast {
            file,
            metric,
            horizon,
            ..
        } => {
            forecast::run(&analyzer, &file, &metric, horizon, cli.format)?;
        }
        Commands::Batch { files, horizon } => {
            let failed = batch::run(Arc::clone(&analyzer), &files, horizon, cli.format).await?;
            if failed > 0 {
                anyhow::bail!("{} of {} vendor analyses failed", failed, files.len());
            }
        }
    }

    Ok(())
}

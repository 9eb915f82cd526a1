//! Forecast a CSV or JSON file from the command line and print the response as JSON
//!
//! ```text
//! chronoforge <file> [--horizon N] [--model auto|lstm|xgboost|lightgbm|arima|prophet]
//!                    [--confidence 0.90|0.95|0.99] [--config config.json]
//! ```

use clap::Parser;
use forecast_select::loader::load_file;
use forecast_select::{AppConfig, ForecastError, ForecastRequest, ForecastResponse, ForecastSelector, ModelChoice, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "chronoforge")]
#[command(about = "Pick the best forecasting model for a series and forecast it", long_about = None)]
struct Cli {
    /// Input file (CSV or JSON)
    file: PathBuf,

    /// Number of steps to forecast
    #[arg(long, default_value_t = 7)]
    horizon: usize,

    /// Model to use (auto, lstm, xgboost, lightgbm, arima, prophet)
    #[arg(long, default_value = "auto", value_parser = parse_model)]
    model: ModelChoice,

    /// Confidence level of the bounds (0.90, 0.95 or 0.99)
    #[arg(long, default_value_t = 0.95)]
    confidence: f64,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_model(raw: &str) -> std::result::Result<ModelChoice, String> {
    raw.parse().map_err(|err: ForecastError| err.to_string())
}

fn run(cli: Cli) -> Result<String> {
    let config = AppConfig::load(cli.config.as_deref())?;

    let series = load_file(&cli.file)?;
    tracing::info!(file = %cli.file.display(), observations = series.len(), "Series loaded");

    let request = ForecastRequest::new(cli.horizon)
        .with_model(cli.model)
        .with_confidence_level(cli.confidence);
    let selector = ForecastSelector::from_config(config.selector);
    let outcome = selector.run(&series, &request)?;
    let response = ForecastResponse::from_outcome(&outcome);
    Ok(serde_json::to_string_pretty(&response)?)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chronoforge=info,forecast_select=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            if err.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_select::ModelKind;

    #[test]
    fn defaults_match_the_request_defaults() {
        let cli = Cli::try_parse_from(["chronoforge", "sales.csv"]).unwrap();
        assert_eq!(cli.file, PathBuf::from("sales.csv"));
        assert_eq!(cli.horizon, 7);
        assert_eq!(cli.model, ModelChoice::Auto);
        assert_eq!(cli.confidence, 0.95);
        assert!(cli.config.is_none());
    }

    #[test]
    fn flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "chronoforge",
            "sales.json",
            "--horizon",
            "12",
            "--model",
            "prophet",
            "--confidence",
            "0.99",
            "--config",
            "config.json",
        ])
        .unwrap();
        assert_eq!(cli.horizon, 12);
        assert_eq!(cli.model, ModelChoice::Pinned(ModelKind::Prophet));
        assert_eq!(cli.confidence, 0.99);
        assert_eq!(cli.config, Some(PathBuf::from("config.json")));
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["chronoforge", "sales.csv", "--model", "transformer"]).is_err());
        assert!(Cli::try_parse_from(["chronoforge"]).is_err());
    }
}

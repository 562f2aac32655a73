//! `dochub`: operator CLI for document version chains.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use dochub_core::config::{AppConfig, LogFormat, LoggingConfig};

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {e}", cli.config);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    match cli.execute(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Events go to stderr; stdout carries command output only.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().pretty().with_writer(std::io::stderr)))
        .init();
}

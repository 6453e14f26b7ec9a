use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use ohlcv_core::Result;
use ohlcv_loader::{run, Cli, RunSummary};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the file was found.
fn load_env_file(path: &Path) -> std::result::Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

fn execute(cli: &Cli) -> Result<RunSummary> {
    let config = cli.command.config()?;
    let summary = run(&config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // RUST_LOG may come from the env file.
    let env_loaded = load_env_file(&cli.env_file);
    init_tracing();
    match env_loaded {
        Ok(true) => tracing::debug!("Loaded settings from {}", cli.env_file.display()),
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not load {}: {e}", cli.env_file.display()),
    }

    match execute(&cli) {
        Ok(summary) => {
            if let Some(failure) = &summary.failure {
                tracing::warn!(
                    "Stopped after {} committed chunk(s): {failure}",
                    summary.chunks.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            if e.is_fatal() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

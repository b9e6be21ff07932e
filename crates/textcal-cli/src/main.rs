//! textcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use textcal_cli::cli::{Cli, Command, ConfigAction};
use textcal_cli::commands;
use textcal_cli::config::AppConfig;
use textcal_cli::error::CliResult;
use textcal_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::verbose()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match &cli.command {
        Some(Command::Calendars) => commands::calendars(&cli, &config).await,
        Some(Command::CheckLlm) => commands::check_llm(&config).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Path => commands::config_path(cli.config.as_deref()),
            ConfigAction::Dump => commands::config_dump(&config),
        },
        None => commands::extract(&cli, &config).await,
    }
}

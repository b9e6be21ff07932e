//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use textcal_calendar::CalendarGateway;
use textcal_core::{CaptureSource, RawCapture, render_report};
use textcal_llm::{ModelBackend, build_backend};
use textcal_pipeline::{Pipeline, PipelineConfig, RunError};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Default behavior: capture, extract, commit, print the report.
pub async fn extract(cli: &Cli, config: &AppConfig) -> CliResult<()> {
    let pipeline_config = pipeline_config_for(cli, config)?;
    let capture = read_capture(cli)?;
    let timezone = pipeline_config.normalize.timezone;

    let backend = model_backend(&pipeline_config)?;
    let store = config.build_store(cli.dry_run)?;
    let pipeline = Pipeline::new(backend, store, pipeline_config);

    let report = pipeline.extract(&capture).await?;
    print!("{}", render_report(&report, timezone));
    if cli.dry_run {
        println!("(dry run, nothing was committed)");
    }
    Ok(())
}

/// Lists writable calendars, marking the default.
///
/// This only talks to the store; no model credentials are needed.
pub async fn calendars(cli: &Cli, config: &AppConfig) -> CliResult<()> {
    let pipeline_config = pipeline_config_for(cli, config)?;
    let store = config.build_store(cli.dry_run)?;
    let gateway = CalendarGateway::new(store, pipeline_config.gateway.clone());

    let infos = gateway
        .list_calendars()
        .await
        .map_err(|e| CliError::Run(RunError::from(e)))?;

    let mut shown = 0;
    for info in infos.iter().filter(|info| !info.read_only) {
        if info.is_default {
            println!("{} (default)", info.name);
        } else {
            println!("{}", info.name);
        }
        shown += 1;
    }
    if shown == 0 {
        println!("No writable calendars.");
    }
    Ok(())
}

/// Sends a tiny prompt to verify the model is reachable.
pub async fn check_llm(config: &AppConfig) -> CliResult<()> {
    let pipeline_config = config.to_pipeline_config()?;
    let provider = pipeline_config.model.provider;
    let model_name = pipeline_config.model.model_name().to_string();

    let backend = model_backend(&pipeline_config)?;
    // check_model never touches the store, the in-memory one just
    // satisfies the pipeline constructor.
    let store = config.build_store(true)?;
    let pipeline = Pipeline::new(backend, store, pipeline_config);

    info!(provider = %provider, model = %model_name, "checking model connectivity");
    let reply = pipeline.check_model().await?;
    println!("{} ({}) replied: {}", model_name, provider, reply);
    Ok(())
}

/// Shows the configuration file location.
pub fn config_path(explicit: Option<&Path>) -> CliResult<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    println!("{}", path.display());
    Ok(())
}

/// Dumps the resolved configuration with secrets masked.
pub fn config_dump(config: &AppConfig) -> CliResult<()> {
    let rendered = toml::to_string_pretty(&config.masked())
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", AppConfig::default_path().display());
    print!("{}", rendered);
    Ok(())
}

/// Applies per-run CLI overrides on top of the file configuration.
fn pipeline_config_for(cli: &Cli, config: &AppConfig) -> CliResult<PipelineConfig> {
    let mut pipeline_config = config.to_pipeline_config()?;
    if let Some(name) = &cli.calendar {
        debug!(calendar = %name, "target calendar overridden on the command line");
        pipeline_config.gateway.target_calendar = Some(name.clone());
    }
    Ok(pipeline_config)
}

fn model_backend(config: &PipelineConfig) -> CliResult<Arc<dyn ModelBackend>> {
    let backend = build_backend(&config.model).map_err(|e| CliError::Config(e.to_string()))?;
    Ok(Arc::from(backend))
}

/// Reads the capture from the source the flags select.
///
/// `-t/--text` and `-f/--file` both beat the clipboard default.
fn read_capture(cli: &Cli) -> CliResult<RawCapture> {
    if let Some(text) = &cli.text {
        return Ok(RawCapture::new(text, CaptureSource::Direct));
    }
    if let Some(path) = &cli.file {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::Capture(format!("failed to read {}: {}", path.display(), e))
        })?;
        return Ok(RawCapture::new(text, CaptureSource::File(path.clone())));
    }

    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| CliError::Capture(format!("failed to access the clipboard: {}", e)))?;
    let text = clipboard
        .get_text()
        .map_err(|e| CliError::Capture(format!("failed to read the clipboard: {}", e)))?;
    Ok(RawCapture::new(text, CaptureSource::Clipboard))
}

//! Command-line interface: capture, extract, report.
//!
//! This crate provides the `textcal` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{CliError, CliResult};

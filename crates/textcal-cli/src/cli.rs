//! Clap definitions for the `textcal` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// textcal - turn captured text into calendar events
#[derive(Debug, Parser)]
#[command(name = "textcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this configuration file
    #[arg(long, short, env = "TEXTCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extract from this text instead of the clipboard
    #[arg(long, short = 't', conflicts_with = "file")]
    pub text: Option<String>,

    /// Extract from a file instead of the clipboard
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Target calendar name, overriding the configured default
    #[arg(long)]
    pub calendar: Option<String>,

    /// Run the full pipeline against an in-memory store, committing nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose logging with code locations
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands. Without one, textcal extracts from the clipboard.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List writable calendars
    Calendars,

    /// Check that the configured model responds
    CheckLlm,

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// What `textcal config` should do.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the configuration file path
    Path,

    /// Dump the resolved configuration with secrets masked
    Dump,
}

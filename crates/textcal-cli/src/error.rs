//! CLI error types and exit codes.

use std::fmt;

use textcal_pipeline::{FailureKind, RunError};

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error (bad file, bad value, unusable store setup).
    Config(String),
    /// The capture source could not be read (clipboard, file).
    Capture(String),
    /// The pipeline run failed.
    Run(RunError),
}

impl CliError {
    /// Maps the error to the process exit code.
    ///
    /// 0 is success (including zero events found), 1 a run failure, 2 a
    /// usage or configuration error. Clap reports its own usage errors
    /// with exit code 2 before this is ever reached.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Run(err) if err.kind() == FailureKind::Configuration => 2,
            Self::Capture(_) | Self::Run(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Capture(msg) => write!(f, "capture error: {}", msg),
            Self::Run(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Run(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RunError> for CliError {
    fn from(err: RunError) -> Self {
        Self::Run(err)
    }
}

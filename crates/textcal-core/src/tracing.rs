//! Logging bootstrap shared by the binary and embedders.
//!
//! Extraction reports print to stdout, so log lines always go to stderr.
//! `RUST_LOG` overrides the configured level when set.
//!
//! ```ignore
//! use textcal_core::{TracingConfig, init_tracing};
//!
//! init_tracing(TracingConfig::verbose())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// Another subscriber was installed first.
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The filter directive did not parse.
    #[error("bad log filter directive: {0}")]
    BadFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line text.
    #[default]
    Text,
    /// One JSON object per line, for service wrappers.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level used when no filter directive overrides it.
    pub level: Level,
    /// Line rendering.
    pub format: LogFormat,
    /// Annotate lines with file and line numbers.
    pub code_locations: bool,
    /// Annotate lines with the emitting module path.
    pub module_targets: bool,
    /// Prefix lines with a timestamp. Off for interactive use.
    pub timestamps: bool,
    /// Full filter directive, wins over `level`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Text,
            code_locations: false,
            module_targets: false,
            timestamps: false,
            filter: None,
        }
    }
}

impl TracingConfig {
    /// The configuration behind the CLI `--debug` flag.
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            code_locations: true,
            module_targets: true,
            ..Self::default()
        }
    }

    /// Sets the fallback log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the line rendering.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a full filter directive.
    #[must_use]
    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = Some(directive.into());
        self
    }
}

/// Installs the global tracing subscriber. Call once, at startup.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed or the filter
/// directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = match config.filter {
        Some(ref directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("textcal={}", config.level))),
    };

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.code_locations)
        .with_line_number(config.code_locations)
        .with_target(config.module_targets);

    let layer = match config.format {
        LogFormat::Text => {
            let text = base.compact();
            if config.timestamps {
                text.boxed()
            } else {
                text.without_time().boxed()
            }
        }
        LogFormat::Json => base.json().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_text_by_default() {
        let config = TracingConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Text);
        assert!(!config.code_locations);
        assert!(!config.module_targets);
        assert!(!config.timestamps);
        assert!(config.filter.is_none());
    }

    #[test]
    fn verbose_annotates_code_locations() {
        let config = TracingConfig::verbose();
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.code_locations);
        assert!(config.module_targets);
        assert!(!config.timestamps);
    }

    #[test]
    fn overrides_compose() {
        let config = TracingConfig::default()
            .with_level(Level::INFO)
            .with_format(LogFormat::Json)
            .with_filter("textcal=debug,reqwest=warn");

        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter.as_deref(), Some("textcal=debug,reqwest=warn"));
    }
}

//! Application configuration.
//!
//! All settings live in a single `config.toml` at
//! `~/.config/textcal/config.toml` by default. Every section and field has
//! a default, so a partial file (or no file at all) works.
//!
//! Secret values (`openai_api_key`, `anthropic_api_key`, `caldav_password`)
//! support `env:VAR` and `pass:path` references; an empty API key falls back
//! to the provider's well-known environment variable (`OPENAI_API_KEY`,
//! `ANTHROPIC_API_KEY`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use textcal_calendar::{CalendarStore, GatewayConfig, MemoryStore};
use textcal_core::TextLimits;
use textcal_llm::{ModelConfig, ProviderKind, RetryPolicy};
use textcal_pipeline::{NormalizeConfig, PipelineConfig};

use crate::error::{CliError, CliResult};
use crate::secret;

/// Configuration for the textcal CLI (`config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model provider settings.
    pub llm: LlmSettings,

    /// Calendar and normalization settings.
    pub calendar: CalendarSettings,

    /// Capture length bounds.
    pub text: TextSettings,

    /// Retry and tolerance knobs.
    pub advanced: AdvancedSettings,
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider name: "openai", "anthropic", or "ollama".
    pub provider: String,

    /// OpenAI API key (literal, `env:VAR`, or `pass:path`).
    pub openai_api_key: String,

    /// Anthropic API key (literal, `env:VAR`, or `pass:path`).
    pub anthropic_api_key: String,

    /// Model for the OpenAI provider.
    pub openai_model: String,

    /// Model for the Anthropic provider.
    pub anthropic_model: String,

    /// Model for the Ollama provider.
    pub ollama_model: String,

    /// Ollama server URL.
    pub ollama_base_url: String,

    /// Sampling temperature, in [0, 2].
    pub temperature: f32,

    /// Token generation cap passed to the model.
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            openai_model: "gpt-4".to_string(),
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            ollama_model: "llama3".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Calendar and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar events go to; empty uses the store default.
    pub default_calendar: String,

    /// IANA timezone name; empty uses the system timezone.
    pub timezone: String,

    /// Event length when the text states no end, in minutes.
    pub default_duration: u32,

    /// Reminder offset before the start, in minutes.
    pub default_reminder: u32,

    /// CalDAV collection root URL.
    pub caldav_url: String,

    /// CalDAV username.
    pub caldav_username: String,

    /// CalDAV password (literal, `env:VAR`, or `pass:path`).
    pub caldav_password: String,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            default_calendar: String::new(),
            timezone: String::new(),
            default_duration: 60,
            default_reminder: 15,
            caldav_url: String::new(),
            caldav_username: String::new(),
            caldav_password: String::new(),
        }
    }
}

/// Capture length bounds, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    /// Shortest accepted capture.
    pub min_length: usize,

    /// Longest accepted capture.
    pub max_length: usize,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 5000,
        }
    }
}

/// Retry and tolerance knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Model call attempts before giving up.
    pub max_retries: u32,

    /// Per-request timeout in seconds.
    pub request_timeout: u64,

    /// Two events with the same title whose starts differ by no more than
    /// this many seconds count as duplicates.
    pub duplicate_tolerance: u32,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout: 30,
            duplicate_tolerance: 60,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults; an unreadable or unparsable file
    /// is a configuration error.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("textcal")
            .join("config.toml")
    }

    /// Validates the settings and assembles the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Unknown provider, out-of-range temperature or token bound, missing
    /// API key, bad timezone name, zero duration, and inverted length
    /// bounds are all configuration errors, reported before any network
    /// call.
    pub fn to_pipeline_config(&self) -> CliResult<PipelineConfig> {
        let model = self.model_config()?;

        if self.calendar.default_duration == 0 {
            return Err(CliError::Config(
                "calendar.default_duration must be positive".to_string(),
            ));
        }
        if self.text.min_length > self.text.max_length {
            return Err(CliError::Config(format!(
                "text.min_length ({}) exceeds text.max_length ({})",
                self.text.min_length, self.text.max_length
            )));
        }

        let normalize = NormalizeConfig::new(self.resolve_timezone()?)
            .with_default_duration(self.calendar.default_duration)
            .with_default_reminder(self.calendar.default_reminder);

        let retry = RetryPolicy::new(
            self.advanced.max_retries,
            StdDuration::from_secs(self.advanced.request_timeout),
        );

        let mut gateway = GatewayConfig::new().with_duplicate_tolerance(
            chrono::Duration::seconds(i64::from(self.advanced.duplicate_tolerance)),
        );
        let target = self.calendar.default_calendar.trim();
        if !target.is_empty() {
            gateway = gateway.with_target_calendar(target);
        }

        Ok(PipelineConfig::new(model)
            .with_retry(retry)
            .with_limits(TextLimits::new(self.text.min_length, self.text.max_length))
            .with_normalize(normalize)
            .with_gateway(gateway))
    }

    /// Builds the model configuration for the selected provider.
    fn model_config(&self) -> CliResult<ModelConfig> {
        let provider = match self.llm.provider.trim().to_lowercase().as_str() {
            "openai" => ProviderKind::OpenAi,
            "anthropic" => ProviderKind::Anthropic,
            "ollama" => ProviderKind::Ollama,
            other => {
                return Err(CliError::Config(format!(
                    "unknown llm.provider {:?} (expected openai, anthropic, or ollama)",
                    other
                )));
            }
        };

        let mut model = ModelConfig::new(provider)
            .with_temperature(self.llm.temperature)
            .with_max_tokens(self.llm.max_tokens);

        let model_name = match provider {
            ProviderKind::OpenAi => &self.llm.openai_model,
            ProviderKind::Anthropic => &self.llm.anthropic_model,
            ProviderKind::Ollama => &self.llm.ollama_model,
        };
        if !model_name.trim().is_empty() {
            model = model.with_model(model_name.trim());
        }
        if provider == ProviderKind::Ollama && !self.llm.ollama_base_url.trim().is_empty() {
            model = model.with_base_url(self.llm.ollama_base_url.trim());
        }
        if let Some(key) = self.resolve_api_key(provider)? {
            model = model.with_api_key(key);
        }

        model
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(model)
    }

    /// Resolves the API key for the provider.
    ///
    /// An explicit value goes through the secret resolver; an empty value
    /// falls back to the provider's conventional environment variable.
    fn resolve_api_key(&self, provider: ProviderKind) -> CliResult<Option<String>> {
        let (raw, fallback) = match provider {
            ProviderKind::OpenAi => (&self.llm.openai_api_key, "OPENAI_API_KEY"),
            ProviderKind::Anthropic => (&self.llm.anthropic_api_key, "ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => return Ok(None),
        };

        if raw.trim().is_empty() {
            return Ok(std::env::var(fallback).ok().filter(|key| !key.is_empty()));
        }
        secret::resolve(raw.trim())
            .map(Some)
            .map_err(|e| CliError::Config(format!("llm API key: {}", e)))
    }

    /// Resolves the timezone used for wall-clock projection.
    fn resolve_timezone(&self) -> CliResult<Tz> {
        let name = self.calendar.timezone.trim();
        if name.is_empty() {
            return Ok(system_timezone());
        }
        name.parse::<Tz>().map_err(|_| {
            CliError::Config(format!(
                "calendar.timezone {:?} is not an IANA timezone name",
                name
            ))
        })
    }

    /// Builds the calendar store the gateway will write to.
    ///
    /// A dry run uses the in-memory store, so the whole pipeline runs
    /// (duplicate checks included) without touching a real calendar.
    pub fn build_store(&self, dry_run: bool) -> CliResult<Arc<dyn CalendarStore>> {
        if dry_run {
            debug!("dry run, using the in-memory store");
            return Ok(Arc::new(MemoryStore::with_default_calendar()));
        }

        #[cfg(feature = "caldav")]
        {
            use textcal_calendar::caldav::{CalDavConfig, CalDavStore};

            let url = self.calendar.caldav_url.trim();
            if url.is_empty() {
                return Err(CliError::Config(
                    "calendar.caldav_url is not set; configure a CalDAV server or use --dry-run"
                        .to_string(),
                ));
            }
            let mut config = CalDavConfig::new(url)
                .map_err(|e| CliError::Config(format!("invalid calendar.caldav_url: {}", e)))?
                .with_timeout(StdDuration::from_secs(u64::from(
                    self.advanced.request_timeout,
                )));
            if !self.calendar.caldav_username.is_empty() {
                let password = secret::resolve(self.calendar.caldav_password.trim())
                    .map_err(|e| CliError::Config(format!("calendar.caldav_password: {}", e)))?;
                config = config.with_credentials(self.calendar.caldav_username.trim(), password);
            }
            let store = CalDavStore::new(config).map_err(|e| CliError::Config(e.to_string()))?;
            return Ok(Arc::new(store));
        }

        #[cfg(not(feature = "caldav"))]
        {
            Err(CliError::Config(
                "this build has no CalDAV support; use --dry-run".to_string(),
            ))
        }
    }

    /// Returns a copy with literal secrets replaced by `***`.
    ///
    /// `env:`/`pass:` references only name where a secret lives, so they
    /// stay visible.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.llm.openai_api_key = mask(&self.llm.openai_api_key);
        masked.llm.anthropic_api_key = mask(&self.llm.anthropic_api_key);
        masked.calendar.caldav_password = mask(&self.calendar.caldav_password);
        masked
    }
}

fn mask(value: &str) -> String {
    if value.is_empty() || secret::is_reference(value) {
        value.to_string()
    } else {
        "***".to_string()
    }
}

/// Best-effort system timezone: `TZ` when it names an IANA zone, then the
/// `/etc/localtime` symlink, then UTC.
fn system_timezone() -> Tz {
    if let Ok(name) = std::env::var("TZ")
        && let Ok(tz) = name.trim().parse::<Tz>()
    {
        return tz;
    }
    if let Ok(target) = std::fs::read_link("/etc/localtime")
        && let Some(name) = zoneinfo_name(&target)
        && let Ok(tz) = name.parse::<Tz>()
    {
        return tz;
    }
    warn!("could not determine the system timezone, using UTC");
    chrono_tz::UTC
}

/// Extracts `Europe/Paris` from `…/zoneinfo/Europe/Paris`.
fn zoneinfo_name(path: &Path) -> Option<&str> {
    path.to_str()?
        .split_once("/zoneinfo/")
        .map(|(_, name)| name)
}

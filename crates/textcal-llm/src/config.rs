//! Model provider configuration and backend construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::anthropic::AnthropicBackend;
use crate::backend::{CompletionRequest, ModelBackend};
use crate::error::{ModelError, ModelResult};
use crate::ollama::OllamaBackend;
use crate::openai::OpenAiBackend;

/// Which provider family to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI or any OpenAI-compatible endpoint.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Local Ollama server.
    Ollama,
}

impl ProviderKind {
    /// Model used when the configuration names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Anthropic => "claude-3-sonnet-20240229",
            Self::Ollama => "llama3",
        }
    }

    /// Endpoint used when the configuration names none.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => OpenAiBackend::DEFAULT_BASE_URL,
            Self::Anthropic => AnthropicBackend::DEFAULT_BASE_URL,
            Self::Ollama => OllamaBackend::DEFAULT_BASE_URL,
        }
    }

    /// Hosted providers need a key; a local server does not.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Returns the lowercase provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::OpenAi
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the model client.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Provider family.
    pub provider: ProviderKind,
    /// Model name; `None` uses the provider default.
    pub model: Option<String>,
    /// API key for hosted providers.
    pub api_key: Option<String>,
    /// Endpoint override; `None` uses the provider default.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Most tokens the model may generate.
    pub max_tokens: u32,
}

impl ModelConfig {
    /// Default sampling temperature. Low on purpose, extraction should be
    /// close to deterministic.
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    /// Default token bound.
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;

    /// Creates a configuration for the given provider with defaults.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: None,
            api_key: None,
            base_url: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    /// Sets the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the token bound.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Returns the model name, falling back to the provider default.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(self.provider.default_model())
    }

    /// Returns the endpoint, falling back to the provider default.
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.default_base_url())
    }

    /// Builds a completion request for this configuration.
    pub fn completion_request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest::new(prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an out-of-range temperature, a zero
    /// token bound, or a missing API key on a hosted provider.
    pub fn validate(&self) -> ModelResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ModelError::configuration(format!(
                "temperature {} is outside [0, 2]",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ModelError::configuration("max_tokens must be positive"));
        }
        if self.provider.requires_api_key()
            && self.api_key.as_deref().is_none_or(|key| key.trim().is_empty())
        {
            return Err(ModelError::configuration(format!(
                "provider {} requires an API key",
                self.provider
            ))
            .with_backend(self.provider.as_str()));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ProviderKind::default())
    }
}

/// Builds the backend described by the configuration.
///
/// # Errors
///
/// Returns a configuration error when [`ModelConfig::validate`] fails or the
/// HTTP client cannot be constructed.
pub fn build_backend(config: &ModelConfig) -> ModelResult<Box<dyn ModelBackend>> {
    config.validate()?;

    let api_key = config.api_key.clone().unwrap_or_default();
    let backend: Box<dyn ModelBackend> = match config.provider {
        ProviderKind::OpenAi => Box::new(OpenAiBackend::new(
            config.endpoint(),
            api_key,
            config.model_name(),
        )?),
        ProviderKind::Anthropic => Box::new(AnthropicBackend::new(
            config.endpoint(),
            api_key,
            config.model_name(),
        )?),
        ProviderKind::Ollama => Box::new(OllamaBackend::new(config.endpoint(), config.model_name())?),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for kind in [ProviderKind::OpenAi, ProviderKind::Anthropic, ProviderKind::Ollama] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: ProviderKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn defaults_resolve_per_provider() {
        let config = ModelConfig::new(ProviderKind::Anthropic);
        assert_eq!(config.model_name(), "claude-3-sonnet-20240229");
        assert_eq!(config.endpoint(), "https://api.anthropic.com/v1");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, 1000);

        let config = ModelConfig::new(ProviderKind::Ollama).with_model("mistral");
        assert_eq!(config.model_name(), "mistral");
        assert_eq!(config.endpoint(), "http://localhost:11434");
    }

    #[test]
    fn validate_rejects_bad_sampling_parameters() {
        let config = ModelConfig::new(ProviderKind::Ollama).with_temperature(2.5);
        assert!(config.validate().is_err());

        let config = ModelConfig::new(ProviderKind::Ollama).with_temperature(-0.1);
        assert!(config.validate().is_err());

        let config = ModelConfig::new(ProviderKind::Ollama).with_max_tokens(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn hosted_providers_need_a_key() {
        assert!(ModelConfig::new(ProviderKind::OpenAi).validate().is_err());
        assert!(ModelConfig::new(ProviderKind::OpenAi)
            .with_api_key("   ")
            .validate()
            .is_err());
        assert!(ModelConfig::new(ProviderKind::OpenAi)
            .with_api_key("sk-test")
            .validate()
            .is_ok());
        assert!(ModelConfig::new(ProviderKind::Ollama).validate().is_ok());
    }

    #[test]
    fn build_backend_dispatches_on_provider() {
        let backend =
            build_backend(&ModelConfig::new(ProviderKind::OpenAi).with_api_key("sk-test"))
                .unwrap();
        assert_eq!(backend.name(), "openai");

        let backend = build_backend(&ModelConfig::new(ProviderKind::Ollama)).unwrap();
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn completion_request_carries_sampling_parameters() {
        let config = ModelConfig::new(ProviderKind::Ollama)
            .with_temperature(0.3)
            .with_max_tokens(512);
        let request = config.completion_request("prompt");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 512);
    }
}

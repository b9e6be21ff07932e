//! Assembled configuration for a pipeline run.

use textcal_calendar::GatewayConfig;
use textcal_core::TextLimits;
use textcal_llm::{ModelConfig, RetryPolicy};

use crate::normalize::NormalizeConfig;

/// Everything a [`crate::Pipeline`] needs to run.
///
/// Each section carries its own defaults; callers usually set the model and
/// leave the rest alone. The capture limit doubles as the prompt budget so
/// accepted text is never truncated on its way to the model.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model provider selection and request shape.
    pub model: ModelConfig,
    /// Retry behavior for model calls.
    pub retry: RetryPolicy,
    /// Capture length bounds.
    pub limits: TextLimits,
    /// Candidate shaping rules.
    pub normalize: NormalizeConfig,
    /// Calendar commit behavior.
    pub gateway: GatewayConfig,
}

impl PipelineConfig {
    /// Creates a configuration around the given model, defaults elsewhere.
    pub fn new(model: ModelConfig) -> Self {
        Self {
            model,
            retry: RetryPolicy::default(),
            limits: TextLimits::default(),
            normalize: NormalizeConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }

    /// Sets the retry policy for model calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the capture size limits.
    pub fn with_limits(mut self, limits: TextLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the normalization rules.
    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    /// Sets the gateway behavior.
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

//! Retry and timeout layer around a [`ModelBackend`].
//!
//! Every attempt gets its own deadline; an elapsed deadline is a retryable
//! timeout. Only errors whose code is retryable trigger another attempt,
//! with exponential backoff between attempts.

use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{CompletionRequest, ModelBackend};
use crate::error::{ModelError, ModelResult};

/// Retry policy: attempt count, per-attempt deadline and backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Deadline applied to each individual attempt.
    pub request_timeout: Duration,
    /// Backoff before the second attempt.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt count and per-attempt deadline.
    pub fn new(max_attempts: u32, request_timeout: Duration) -> Self {
        Self {
            max_attempts,
            request_timeout,
            ..Self::default()
        }
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates backoff delay based on consecutive failures.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self
            .backoff_multiplier
            .powi(consecutive_failures as i32 - 1);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// Runs one completion under the retry policy.
///
/// Retries only errors classified as retryable (timeouts, rate limits,
/// network and server errors). Fatal errors, bad credentials for example,
/// return immediately.
///
/// # Errors
///
/// Returns the last attempt's error once attempts are exhausted.
pub async fn complete_with_retry(
    backend: &dyn ModelBackend,
    request: &CompletionRequest,
    policy: &RetryPolicy,
) -> ModelResult<String> {
    let attempts = policy.max_attempts.max(1);
    let mut failures = 0u32;

    loop {
        let attempt = failures + 1;
        debug!(
            backend = %backend.name(),
            attempt,
            max_attempts = attempts,
            "requesting completion"
        );

        let outcome = tokio::time::timeout(policy.request_timeout, backend.complete(request))
            .await
            .unwrap_or_else(|_| {
                Err(ModelError::timeout(format!(
                    "no response within {:?}",
                    policy.request_timeout
                ))
                .with_backend(backend.name()))
            });

        let error = match outcome {
            Ok(completion) => return Ok(completion),
            Err(error) => error,
        };

        failures += 1;
        if !error.is_retryable() || failures >= attempts {
            return Err(error);
        }

        let delay = policy.backoff_delay(failures);
        warn!(
            backend = %backend.name(),
            attempt,
            code = error.code().as_str(),
            delay_ms = delay.as_millis() as u64,
            "completion attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

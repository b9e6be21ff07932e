//! ModelBackend trait definition.
//!
//! This module defines the [`ModelBackend`] trait, the abstraction over
//! language model providers (OpenAI, Anthropic, Ollama). A backend does one
//! thing: take a prompt plus bounded sampling parameters and return a single
//! text completion. Retry, timeout and parsing live outside the backend.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::error::{ModelError, ModelResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so backends can be selected by
/// configuration at construction time and passed around as `Box<dyn ModelBackend>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One completion request: the prompt plus bounded sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Sampling temperature, in `[0, 2]`.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Creates a request with default sampling parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Caps the completion length in tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// The core abstraction over language model providers.
///
/// Implementations must be `Send + Sync` and should clone whatever they
/// need out of the request before entering the async block, so the returned
/// future only borrows `self`.
pub trait ModelBackend: Send + Sync {
    /// Returns the name of this backend (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Sends the prompt and returns the raw text completion.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` on network failures, authentication problems,
    /// rate limits or malformed response envelopes. The per-call timeout is
    /// enforced by the caller, not here.
    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, ModelResult<String>>;
}

/// A backend that replays one canned completion and counts calls.
///
/// Useful for tests and as a placeholder when wiring a pipeline without
/// network access.
#[derive(Debug)]
pub struct StaticBackend {
    completion: String,
    calls: AtomicUsize,
}

impl StaticBackend {
    /// Creates a backend that always returns `completion`.
    pub fn new(completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    fn complete(&self, _request: &CompletionRequest) -> BoxFuture<'_, ModelResult<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let completion = self.completion.clone();
        Box::pin(async move { Ok(completion) })
    }
}

/// A backend that plays back a fixed sequence of results.
///
/// Each call pops the next scripted result; an exhausted script reports an
/// internal error. This is the shape retry tests need: failures followed by
/// a success.
#[derive(Debug)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ModelResult<String>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Creates a backend from a sequence of results.
    pub fn new(script: Vec<ModelResult<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, _request: &CompletionRequest) -> BoxFuture<'_, ModelResult<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.script
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::internal("scripted backend exhausted")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let request = CompletionRequest::new("hello")
            .with_temperature(0.7)
            .with_max_tokens(256);
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 256);
    }

    #[test]
    fn request_defaults() {
        let request = CompletionRequest::new("hi");
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 1000);
    }

    #[tokio::test]
    async fn static_backend_replays_and_counts() {
        let backend = StaticBackend::new("[]");
        let request = CompletionRequest::new("anything");

        assert_eq!(backend.complete(&request).await.unwrap(), "[]");
        assert_eq!(backend.complete(&request).await.unwrap(), "[]");
        assert_eq!(backend.calls(), 2);
        assert_eq!(backend.name(), "static");
    }

    #[tokio::test]
    async fn scripted_backend_plays_sequence() {
        let backend = ScriptedBackend::new(vec![
            Err(ModelError::server("first try fails")),
            Ok("second try".to_string()),
        ]);
        let request = CompletionRequest::new("anything");

        assert!(backend.complete(&request).await.is_err());
        assert_eq!(backend.complete(&request).await.unwrap(), "second try");
        assert_eq!(backend.calls(), 2);

        // Exhausted script keeps failing rather than panicking.
        let err = backend.complete(&request).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ModelErrorCode::InternalError);
    }
}

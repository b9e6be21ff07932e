//! ModelBackend trait and implementations.
//!
//! This crate owns everything between raw text and candidate events:
//!
//! - [`build_prompt`] - Deterministic prompt construction with a date anchor
//! - [`ModelBackend`] - The trait all model providers implement
//! - [`complete_with_retry`] - Timeout and retry wrapper around a backend
//! - [`parse_events`] - Tolerant decoding of model output into candidates
//! - [`ModelError`] - Error types with a transient/fatal split
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │   OpenAI API    │   │  Anthropic API  │   │  Ollama server  │
//! └────────┬────────┘   └────────┬────────┘   └────────┬────────┘
//!          │                     │                     │
//!          ▼                     ▼                     ▼
//! ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │  OpenAiBackend  │   │ AnthropicBackend│   │  OllamaBackend  │
//! └────────┬────────┘   └────────┬────────┘   └────────┬────────┘
//!          │                     │                     │
//!          │             ModelBackend                  │
//!          └──────────────┬──────┴─────────────────────┘
//!                         │
//!                         ▼ complete_with_retry()
//!                  ┌─────────────┐
//!                  │  raw text   │
//!                  └──────┬──────┘
//!                         │
//!                         ▼ parse_events()
//!                  ┌────────────────┐
//!                  │ CandidateEvent │
//!                  └────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use textcal_llm::{build_backend, build_prompt, complete_with_retry, parse_events};
//!
//! async fn extract(config: &ModelConfig, text: &str, now: DateTime<Tz>) -> ModelResult<ParseOutcome> {
//!     let backend = build_backend(config)?;
//!     let prompt = build_prompt(text, now, 4000);
//!     let request = config.completion_request(prompt.text);
//!     let response = complete_with_retry(backend.as_ref(), &request, &RetryPolicy::default()).await?;
//!     Ok(parse_events(&response))
//! }
//! ```

pub mod anthropic;
pub mod backend;
pub mod config;
pub mod error;
mod http;
pub mod ollama;
pub mod openai;
pub mod parse;
pub mod prompt;
pub mod retry;

pub use anthropic::AnthropicBackend;
pub use backend::{BoxFuture, CompletionRequest, ModelBackend, ScriptedBackend, StaticBackend};
pub use config::{ModelConfig, ProviderKind, build_backend};
pub use error::{ModelError, ModelErrorCode, ModelResult};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use parse::{ParseOutcome, parse_events};
pub use prompt::{Prompt, TRUNCATION_MARKER, build_prompt};
pub use retry::{RetryPolicy, complete_with_retry};

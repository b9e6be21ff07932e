//! OpenAI-compatible backend.
//!
//! Talks to the `/chat/completions` endpoint with Bearer authentication.
//! Any OpenAI-compatible server works by pointing `base_url` at it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{BoxFuture, CompletionRequest, ModelBackend};
use crate::error::{ModelError, ModelResult};
use crate::http;

const BACKEND: &str = "openai";

/// Backend for OpenAI and OpenAI-compatible chat completion APIs.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Creates a backend for the given endpoint and model.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> ModelResult<Self> {
        let client = http::build_client(http::CONNECT_TIMEOUT)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Pulls the completion text out of a chat completion response body.
fn extract_completion(body: &str) -> ModelResult<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::invalid_response(format!("failed to decode response: {}", e))
            .with_backend(BACKEND)
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            ModelError::invalid_response("response contained no completion choices")
                .with_backend(BACKEND)
        })
}

impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, ModelResult<String>> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        Box::pin(async move {
            let url = format!("{}/chat/completions", self.base_url);
            debug!(url = %url, model = %self.model, "sending chat completion request");

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| http::send_error(BACKEND, e))?;

            let text = http::read_success(BACKEND, response).await?;
            extract_completion(&text)
        })
    }
}

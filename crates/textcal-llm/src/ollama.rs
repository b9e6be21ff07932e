//! Ollama backend for locally hosted models.
//!
//! Uses the native `/api/generate` endpoint with streaming disabled, so the
//! whole completion arrives in one JSON object. No authentication.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{BoxFuture, CompletionRequest, ModelBackend};
use crate::error::{ModelError, ModelResult};
use crate::http;

const BACKEND: &str = "ollama";

/// Backend for a local Ollama server.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Default server address.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";

    /// Creates a backend for the given server and model.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> ModelResult<Self> {
        let client = http::build_client(http::CONNECT_TIMEOUT)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

fn extract_completion(body: &str) -> ModelResult<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::invalid_response(format!("failed to decode response: {}", e))
            .with_backend(BACKEND)
    })?;
    Ok(parsed.response)
}

impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, ModelResult<String>> {
        let body = GenerateRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        Box::pin(async move {
            let url = format!("{}/api/generate", self.base_url);
            debug!(url = %url, model = %self.model, "sending generate request");

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| http::send_error(BACKEND, e))?;

            let text = http::read_success(BACKEND, response).await?;
            extract_completion(&text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_response_field() {
        let body = r#"{
            "model": "llama3",
            "created_at": "2026-08-24T09:00:00Z",
            "response": "[]",
            "done": true,
            "total_duration": 1234
        }"#;
        assert_eq!(extract_completion(body).unwrap(), "[]");
    }

    #[test]
    fn missing_response_field_is_invalid() {
        let err = extract_completion(r#"{"done": true}"#).unwrap_err();
        assert_eq!(err.code(), crate::error::ModelErrorCode::InvalidResponse);
        assert_eq!(err.backend(), Some("ollama"));
    }

    #[test]
    fn request_body_disables_streaming() {
        let body = GenerateRequest {
            model: "llama3".to_string(),
            prompt: "hello".to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: 0.1,
                num_predict: 1000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], serde_json::json!(false));
        assert_eq!(json["options"]["num_predict"], serde_json::json!(1000));
    }
}

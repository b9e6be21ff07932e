//! Anthropic Messages API backend.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{BoxFuture, CompletionRequest, ModelBackend};
use crate::error::{ModelError, ModelResult};
use crate::http;

const BACKEND: &str = "anthropic";

/// API version header required on every request.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Backend for the Anthropic Messages API.
pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com/v1";

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
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Concatenates the text blocks of a messages response.
fn extract_completion(body: &str) -> ModelResult<String> {
    let parsed: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::invalid_response(format!("failed to decode response: {}", e))
            .with_backend(BACKEND)
    })?;

    let text: Vec<String> = parsed
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();

    if text.is_empty() {
        return Err(
            ModelError::invalid_response("response contained no text blocks")
                .with_backend(BACKEND),
        );
    }

    Ok(text.join("\n"))
}

impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, ModelResult<String>> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![MessageParam {
                role: "user",
                content: request.prompt.clone(),
            }],
        };

        Box::pin(async move {
            let url = format!("{}/messages", self.base_url);
            debug!(url = %url, model = %self.model, "sending messages request");

            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
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
    fn extracts_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-sonnet-20240229",
            "content": [{"type": "text", "text": "[{\"title\": \"Standup\"}]"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 40, "output_tokens": 12}
        }"#;
        assert_eq!(extract_completion(body).unwrap(), r#"[{"title": "Standup"}]"#);
    }

    #[test]
    fn joins_multiple_text_blocks() {
        let body = r#"{"content": [
            {"type": "text", "text": "["},
            {"type": "text", "text": "]"}
        ]}"#;
        assert_eq!(extract_completion(body).unwrap(), "[\n]");
    }

    #[test]
    fn skips_non_text_blocks() {
        let body = r#"{"content": [
            {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
            {"type": "text", "text": "[]"}
        ]}"#;
        assert_eq!(extract_completion(body).unwrap(), "[]");
    }

    #[test]
    fn empty_content_is_invalid_response() {
        let err = extract_completion(r#"{"content": []}"#).unwrap_err();
        assert_eq!(err.code(), crate::error::ModelErrorCode::InvalidResponse);
        assert_eq!(err.backend(), Some("anthropic"));
    }
}

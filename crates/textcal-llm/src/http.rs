//! Shared HTTP plumbing for the hosted backends.
//!
//! All three HTTP backends build their client the same way and map HTTP
//! statuses to [`ModelError`] codes the same way; this module keeps that in
//! one place.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{trace, warn};

use crate::error::{ModelError, ModelResult};

/// User agent sent on every request.
pub(crate) const USER_AGENT: &str = concat!("textcal/", env!("CARGO_PKG_VERSION"));

/// Connection establishment timeout shared by all HTTP backends.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client used by a backend.
///
/// The client carries no per-request timeout; the retry layer wraps each
/// call in its own deadline so that a hung connection counts as a retryable
/// timeout rather than an opaque network error.
pub(crate) fn build_client(connect_timeout: Duration) -> ModelResult<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ModelError::configuration(format!("failed to create HTTP client: {}", e)))
}

/// Maps a failed `send()` into a [`ModelError`].
pub(crate) fn send_error(backend: &str, err: reqwest::Error) -> ModelError {
    let error = if err.is_timeout() {
        ModelError::timeout(format!("request timed out: {}", err))
    } else {
        ModelError::network(format!("request failed: {}", err))
    };
    error.with_backend(backend)
}

/// Checks the response status and extracts the body on success.
///
/// Non-success statuses are mapped to error codes so the retry layer can
/// tell transient failures (rate limits, server errors) from fatal ones
/// (bad credentials, malformed requests).
pub(crate) async fn read_success(backend: &str, response: Response) -> ModelResult<String> {
    let status = response.status();
    trace!(backend = %backend, status = %status, "received response");

    let error = match status {
        s if s.is_success() => {
            return response.text().await.map_err(|e| {
                ModelError::network(format!("failed to read response: {}", e))
                    .with_backend(backend)
            });
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ModelError::authentication("authentication failed: check the API key")
        }
        StatusCode::TOO_MANY_REQUESTS => ModelError::rate_limited("too many requests"),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            let body = response.text().await.unwrap_or_default();
            ModelError::bad_request(format!("request rejected ({}): {}", status, body))
        }
        s if s.is_server_error() => {
            let body = response.text().await.unwrap_or_default();
            ModelError::server(format!("server error ({}): {}", s, body))
        }
        s => {
            let body = response.text().await.unwrap_or_default();
            warn!(backend = %backend, status = %s, body = %body, "unexpected response status");
            ModelError::invalid_response(format!("unexpected status {}: {}", s, body))
        }
    };

    Err(error.with_backend(backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelErrorCode;

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("textcal/"));
    }

    #[test]
    fn client_builds_with_short_timeout() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn status_mapping() {
        let cases = [
            (401, ModelErrorCode::AuthenticationFailed, false),
            (403, ModelErrorCode::AuthenticationFailed, false),
            (429, ModelErrorCode::RateLimited, true),
            (400, ModelErrorCode::BadRequest, false),
            (404, ModelErrorCode::BadRequest, false),
            (500, ModelErrorCode::ServerError, true),
            (503, ModelErrorCode::ServerError, true),
            (302, ModelErrorCode::InvalidResponse, false),
        ];

        for (status, code, retryable) in cases {
            let response: Response = http::Response::builder()
                .status(status)
                .body("nope")
                .unwrap()
                .into();
            let err = read_success("openai", response).await.unwrap_err();
            assert_eq!(err.code(), code, "status {}", status);
            assert_eq!(err.is_retryable(), retryable, "status {}", status);
            assert_eq!(err.backend(), Some("openai"));
        }
    }

    #[tokio::test]
    async fn success_returns_body() {
        let response: Response = http::Response::builder()
            .status(200)
            .body("[]")
            .unwrap()
            .into();
        assert_eq!(read_success("ollama", response).await.unwrap(), "[]");
    }
}

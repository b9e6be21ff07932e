//! Errors raised while obtaining a model completion.
//!
//! Every failure carries a [`ModelErrorCode`] splitting it into transient
//! and fatal. The retry layer keys off that split: transient codes get
//! retried with backoff, fatal ones surface immediately.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout this crate.
pub type ModelResult<T> = Result<T, ModelError>;

/// What went wrong, at the granularity the retry policy cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelErrorCode {
    // Transient: worth another attempt.
    /// The connection failed or broke mid-transfer.
    NetworkError,
    /// The per-call deadline elapsed before a completion arrived.
    Timeout,
    /// The backend asked us to slow down (429).
    RateLimited,
    /// The backend itself failed (5xx).
    ServerError,
    // Fatal: retrying cannot help.
    /// The API key was rejected or missing.
    AuthenticationFailed,
    /// The backend rejected the request as malformed (4xx).
    BadRequest,
    /// The response envelope could not be decoded.
    InvalidResponse,
    /// The backend configuration is unusable.
    ConfigurationError,
    /// A bug on our side.
    InternalError,
}

impl ModelErrorCode {
    /// Whether a call failing with this code may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }

    /// Stable snake_case name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::AuthenticationFailed => "authentication_failed",
            Self::BadRequest => "bad_request",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

/// A failed model call, tagged with its code and the backend it came from.
#[derive(Debug, Error)]
pub struct ModelError {
    code: ModelErrorCode,
    message: String,
    backend: Option<String>,
}

impl ModelError {
    fn coded(code: ModelErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            backend: None,
        }
    }

    /// The connection failed or the body could not be read.
    pub fn network(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::NetworkError, message)
    }

    /// The call ran past its deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::Timeout, message)
    }

    /// The backend returned 429.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::RateLimited, message)
    }

    /// The backend returned a 5xx status.
    pub fn server(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::ServerError, message)
    }

    /// The credentials were rejected.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::AuthenticationFailed, message)
    }

    /// The request itself was refused.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::BadRequest, message)
    }

    /// The response did not have the expected shape.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::InvalidResponse, message)
    }

    /// The configuration cannot produce a working backend.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::ConfigurationError, message)
    }

    /// An invariant broke.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::coded(ModelErrorCode::InternalError, message)
    }

    /// Tags the error with the backend name it came from.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// The code classifying this error.
    pub fn code(&self) -> ModelErrorCode {
        self.code
    }

    /// The backend name, when known.
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    /// Whether the retry layer may try the call again.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Some(name) => write!(f, "[{}] {}: {}", name, self.code.as_str(), self.message),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

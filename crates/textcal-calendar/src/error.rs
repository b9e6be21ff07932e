//! Errors from calendar store operations.
//!
//! The one distinction callers rely on is access denial: a store that
//! refuses access fails the whole run, every other store error stays scoped
//! to the event that triggered it.

use std::fmt;

use thiserror::Error;

/// An error from a calendar store operation.
///
/// Carries a [`StoreErrorCode`], the name of the store it came from when
/// known, and the underlying cause when one exists (an HTTP failure, a
/// URL parse error).
#[derive(Debug, Error)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    store: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    fn tagged(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            store: None,
            source: None,
        }
    }

    /// The user or server refused calendar access.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::AccessDenied, message)
    }

    /// The credentials were rejected.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::AuthenticationFailed, message)
    }

    /// The server was unreachable or the transfer broke.
    pub fn network(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::NetworkError, message)
    }

    /// The server failed (5xx) or rate limited us.
    pub fn server(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::ServerError, message)
    }

    /// The calendar or object does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::NotFound, message)
    }

    /// The server sent something we could not interpret.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::InvalidData, message)
    }

    /// The store configuration is unusable.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::ConfigurationError, message)
    }

    /// An invariant broke inside the store.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::tagged(StoreErrorCode::InternalError, message)
    }

    /// Tags the error with the store it came from.
    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// The code classifying this error.
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Whether this error means calendar access was denied.
    ///
    /// Access denial aborts the run; everything else degrades to a
    /// per-event failure.
    pub fn is_access_denied(&self) -> bool {
        self.code == StoreErrorCode::AccessDenied
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(store) = &self.store {
            write!(f, "[{store}] ")?;
        }
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

/// The category of a store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorCode {
    /// The user or server denied access to calendar data.
    AccessDenied,
    /// The credentials were invalid or missing.
    AuthenticationFailed,
    /// Could not reach the server, or the connection dropped.
    NetworkError,
    /// The server failed or refused to serve.
    ServerError,
    /// No calendar or object with that identifier exists.
    NotFound,
    /// The response payload could not be interpreted.
    InvalidData,
    /// The store configuration is missing or malformed.
    ConfigurationError,
    /// A bug on our side.
    InternalError,
}

impl StoreErrorCode {
    /// Stable snake_case name, used in log fields and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::NotFound => "not_found",
            Self::InvalidData => "invalid_data",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

/// Result alias used throughout this crate.
pub type StoreResult<T> = Result<T, StoreError>;

//! Run-level failures.
//!
//! A [`RunError`] ends the whole run; anything recoverable (a bad candidate,
//! a duplicate) is reported per item instead. Model and store errors are
//! classified on the way in so callers can branch on [`FailureKind`] without
//! inspecting sources.

use thiserror::Error;

use textcal_calendar::StoreError;
use textcal_core::CaptureRejection;
use textcal_llm::{ModelError, ModelErrorCode};

/// Convenience alias for run results.
pub type RunResult<T> = Result<T, RunError>;

/// Coarse failure classification exposed in the final stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The captured text failed validation.
    InvalidCapture,
    /// The run could not start with the given configuration.
    Configuration,
    /// The model provider failed after exhausting retries.
    Provider,
    /// Calendar access was refused.
    AccessDenied,
    /// The calendar store failed while writing.
    Store,
}

impl FailureKind {
    /// Returns a stable identifier for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCapture => "invalid_capture",
            Self::Configuration => "configuration",
            Self::Provider => "provider",
            Self::AccessDenied => "access_denied",
            Self::Store => "store",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal error that aborts a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The capture failed the length checks.
    #[error("capture rejected: {0}")]
    InvalidCapture(#[from] CaptureRejection),
    /// Configuration problems surfaced before or during the run.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The model provider failed and retries were exhausted.
    #[error("model provider error: {0}")]
    Provider(#[source] ModelError),
    /// The calendar store refused access.
    #[error("calendar access denied: {0}")]
    AccessDenied(#[source] StoreError),
    /// The calendar store failed fatally.
    #[error("calendar store error: {0}")]
    Store(#[source] StoreError),
}

impl RunError {
    /// Classifies the error for the final stage.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidCapture(_) => FailureKind::InvalidCapture,
            Self::Configuration(_) => FailureKind::Configuration,
            Self::Provider(_) => FailureKind::Provider,
            Self::AccessDenied(_) => FailureKind::AccessDenied,
            Self::Store(_) => FailureKind::Store,
        }
    }

    /// Returns true when the store refused access.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }
}

impl From<ModelError> for RunError {
    fn from(err: ModelError) -> Self {
        if err.code() == ModelErrorCode::ConfigurationError {
            Self::Configuration(err.to_string())
        } else {
            Self::Provider(err)
        }
    }
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        if err.is_access_denied() {
            Self::AccessDenied(err)
        } else {
            Self::Store(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textcal_core::TextLimits;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(FailureKind::InvalidCapture.as_str(), "invalid_capture");
        assert_eq!(FailureKind::Configuration.as_str(), "configuration");
        assert_eq!(FailureKind::Provider.as_str(), "provider");
        assert_eq!(FailureKind::AccessDenied.as_str(), "access_denied");
        assert_eq!(FailureKind::Store.as_str(), "store");
    }

    #[test]
    fn capture_rejection_converts() {
        let rejection = CaptureRejection::TooShort {
            length: 3,
            min: TextLimits::default().min_chars,
        };
        let err = RunError::from(rejection);
        assert_eq!(err.kind(), FailureKind::InvalidCapture);
        assert!(err.to_string().starts_with("capture rejected:"));
    }

    #[test]
    fn model_errors_split_configuration_from_provider() {
        let err = RunError::from(ModelError::configuration("no API key"));
        assert_eq!(err.kind(), FailureKind::Configuration);

        let err = RunError::from(ModelError::server("upstream 500"));
        assert_eq!(err.kind(), FailureKind::Provider);

        let err = RunError::from(ModelError::timeout("no response in 30s"));
        assert_eq!(err.kind(), FailureKind::Provider);
    }

    #[test]
    fn store_errors_split_access_from_everything_else() {
        let err = RunError::from(StoreError::access_denied("user declined"));
        assert_eq!(err.kind(), FailureKind::AccessDenied);
        assert!(err.is_access_denied());

        let err = RunError::from(StoreError::network("connection reset"));
        assert_eq!(err.kind(), FailureKind::Store);
        assert!(!err.is_access_denied());
    }
}

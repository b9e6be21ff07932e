//! Raw text captures and pre-model length checks.
//!
//! A [`RawCapture`] is the unit of input to the pipeline: a piece of text
//! plus where it came from and when it was captured. Length limits are
//! enforced before any model call so over- or under-sized input never
//! costs a network round trip.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a piece of input text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CaptureSource {
    /// Read from the system clipboard.
    Clipboard,
    /// Read from a file on disk.
    File(PathBuf),
    /// Passed directly as an argument.
    Direct,
}

impl CaptureSource {
    /// Returns a short label for logging and display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clipboard => "clipboard",
            Self::File(_) => "file",
            Self::Direct => "direct",
        }
    }
}

/// Bounds on accepted input length, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLimits {
    /// Minimum number of characters worth sending to a model.
    pub min_chars: usize,
    /// Maximum number of characters accepted in one capture.
    pub max_chars: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            min_chars: 10,
            max_chars: 5000,
        }
    }
}

impl TextLimits {
    /// Creates limits with the given bounds.
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            max_chars,
        }
    }
}

/// Why a capture was refused before reaching the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureRejection {
    /// The text is shorter than the configured minimum.
    #[error("text too short: {length} characters, minimum is {min}")]
    TooShort { length: usize, min: usize },
    /// The text is longer than the configured maximum.
    #[error("text too long: {length} characters, maximum is {max}")]
    TooLong { length: usize, max: usize },
}

/// A piece of raw input text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapture {
    /// The captured text, untouched.
    pub text: String,
    /// Where the text came from.
    pub source: CaptureSource,
    /// When the capture was taken.
    pub captured_at: DateTime<Utc>,
}

impl RawCapture {
    /// Creates a capture taken now.
    pub fn new(text: impl Into<String>, source: CaptureSource) -> Self {
        Self {
            text: text.into(),
            source,
            captured_at: Utc::now(),
        }
    }

    /// Pins the capture timestamp instead of sampling the clock.
    pub fn with_captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    /// Returns the capture length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Checks the capture against configured length limits.
    ///
    /// # Errors
    ///
    /// Returns a [`CaptureRejection`] when the text falls outside
    /// `[min_chars, max_chars]`.
    pub fn check_limits(&self, limits: &TextLimits) -> Result<(), CaptureRejection> {
        let length = self.char_count();
        if length < limits.min_chars {
            return Err(CaptureRejection::TooShort {
                length,
                min: limits.min_chars,
            });
        }
        if length > limits.max_chars {
            return Err(CaptureRejection::TooLong {
                length,
                max: limits.max_chars,
            });
        }
        Ok(())
    }
}

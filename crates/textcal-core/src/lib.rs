//! Core types: captures, candidate and normalized events, time, run reports

pub mod capture;
pub mod event;
pub mod format;
pub mod report;
pub mod time;
pub mod tracing;

pub use capture::{CaptureRejection, CaptureSource, RawCapture, TextLimits};
pub use event::{CandidateEvent, NormalizedEvent};
pub use format::{format_event_time, render_report};
pub use report::{CommitOutcome, EventReport, RunReport, SkipReason};
pub use time::{EventTime, TimeWindow};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};

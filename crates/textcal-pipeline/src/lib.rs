//! The extraction pipeline: captured text in, committed events out.
//!
//! This crate strings the other crates together into one run:
//!
//! - [`resolve_time`] - Dates, clock times, and everyday expressions
//! - [`normalize`] - Candidate validation and default-duration handling
//! - [`Pipeline`] - The stage machine driving capture to calendar
//! - [`RunError`] - Fatal failures, classified by [`FailureKind`]
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐
//! │ RawCapture │
//! └─────┬──────┘
//!       ▼ Validating        length limits
//!       ▼ Extracting        ModelBackend + retries
//!       ▼ Parsing           completion -> CandidateEvent
//!       ▼ Normalizing       resolve_time + defaults, or skip
//!       ▼ CommitRequested   access negotiation (only if needed)
//!       ▼ Committing        CalendarGateway, duplicates skipped
//! ┌─────┴─────┐
//! │ RunReport │  one entry per candidate, in order
//! └───────────┘
//! ```
//!
//! A bad candidate becomes a skipped report entry and the run continues;
//! only capture rejection, configuration problems, exhausted retries,
//! denied access, and store failures abort the whole run.
//!
//! # Example
//!
//! ```ignore
//! use textcal_pipeline::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(backend, store, PipelineConfig::new(model));
//! let report = pipeline.extract(&capture).await?;
//! for entry in &report.entries {
//!     println!("{}: {:?}", entry.title, entry.outcome);
//! }
//! ```

pub mod config;
pub mod dates;
pub mod error;
pub mod normalize;
pub mod run;

pub use config::PipelineConfig;
pub use dates::{ResolvedTime, resolve_time};
pub use error::{FailureKind, RunError, RunResult};
pub use normalize::{NormalizationRejection, NormalizeConfig, normalize};
pub use run::{Pipeline, Stage};

//! Run orchestration.
//!
//! [`Pipeline::extract`] drives a capture through the full stage sequence:
//!
//! - `Validating` checks the capture against the length limits
//! - `Extracting` sends the prompt to the model, with retries
//! - `Parsing` turns the completion into candidates
//! - `Normalizing` resolves each candidate or marks it skipped
//! - `CommitRequested` negotiates calendar access, only when something
//!   will actually be written
//! - `Committing` writes events one by one, duplicates skipped
//!
//! Per-candidate problems become report entries and the run keeps going.
//! Only capture rejection, configuration problems, exhausted model retries,
//! denied access, and store write failures abort the run, landing in
//! `Failed` with a [`FailureKind`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use textcal_calendar::{CalendarGateway, CalendarInfo, CalendarStore};
use textcal_core::{CommitOutcome, EventReport, NormalizedEvent, RawCapture, RunReport};
use textcal_llm::{ModelBackend, build_prompt, complete_with_retry, parse_events};

use crate::config::PipelineConfig;
use crate::error::{FailureKind, RunError, RunResult};
use crate::normalize::normalize;

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing started yet.
    Idle,
    /// Checking the capture against the length limits.
    Validating,
    /// Waiting on the model completion.
    Extracting,
    /// Decoding candidates out of the completion.
    Parsing,
    /// Resolving candidates into committable events.
    Normalizing,
    /// Negotiating calendar access before the first write.
    CommitRequested,
    /// Writing events to the calendar.
    Committing,
    /// The run finished and produced a report.
    Done,
    /// The run aborted.
    Failed(FailureKind),
}

impl Stage {
    /// Returns a stable identifier for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Parsing => "parsing",
            Self::Normalizing => "normalizing",
            Self::CommitRequested => "commit_requested",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Failed(_) => "failed",
        }
    }
}

/// Tracks the stage across one run and logs every transition.
struct RunState {
    stage: Stage,
}

impl RunState {
    fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = self.stage.as_str(), to = next.as_str(), "stage transition");
        self.stage = next;
    }

    fn fail(&mut self, error: RunError) -> RunError {
        let kind = error.kind();
        self.stage = Stage::Failed(kind);
        warn!(kind = %kind, error = %error, "run failed");
        error
    }
}

/// What normalization decided for one candidate, in extraction order.
enum Planned {
    Commit(NormalizedEvent),
    Skip(EventReport),
}

/// The extraction pipeline: captured text in, commit report out.
pub struct Pipeline {
    backend: Arc<dyn ModelBackend>,
    gateway: CalendarGateway,
    config: PipelineConfig,
}

impl Pipeline {
    /// Wires a model backend and a calendar store together under one
    /// configuration.
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        store: Arc<dyn CalendarStore>,
        config: PipelineConfig,
    ) -> Self {
        let gateway = CalendarGateway::new(store, config.gateway.clone());
        Self {
            backend,
            gateway,
            config,
        }
    }

    /// Returns the model backend name.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Returns the calendar store name.
    pub fn store_name(&self) -> &str {
        self.gateway.store_name()
    }

    /// Runs the full capture-to-calendar sequence.
    ///
    /// The report lists every candidate in extraction order with its fate.
    /// A capture with no events in it is a successful run with an empty
    /// report.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] when the capture fails validation, the model
    /// fails after retries, calendar access is denied, or a write fails.
    /// Individual bad candidates never abort the run.
    pub async fn extract(&self, capture: &RawCapture) -> RunResult<RunReport> {
        let mut state = RunState::new();
        info!(
            source = capture.source.label(),
            chars = capture.char_count(),
            backend = self.backend.name(),
            "starting extraction run"
        );

        state.advance(Stage::Validating);
        if let Err(rejection) = capture.check_limits(&self.config.limits) {
            return Err(state.fail(rejection.into()));
        }

        state.advance(Stage::Extracting);
        let local_now = capture
            .captured_at
            .with_timezone(&self.config.normalize.timezone);
        let prompt = build_prompt(&capture.text, local_now, self.config.limits.max_chars);
        if prompt.truncated {
            warn!(
                max_chars = self.config.limits.max_chars,
                "capture truncated to fit the prompt budget"
            );
        }
        let request = self.config.model.completion_request(prompt.text);
        let completion =
            match complete_with_retry(self.backend.as_ref(), &request, &self.config.retry).await {
                Ok(completion) => completion,
                Err(err) => return Err(state.fail(err.into())),
            };

        state.advance(Stage::Parsing);
        let outcome = parse_events(&completion);
        let mut report = RunReport::new();
        if let Some(diagnostic) = outcome.diagnostic() {
            report = report.with_diagnostic(diagnostic);
        }

        state.advance(Stage::Normalizing);
        let mut planned = Vec::with_capacity(outcome.events.len());
        for candidate in &outcome.events {
            match normalize(candidate, capture.captured_at, &self.config.normalize) {
                Ok(event) => planned.push(Planned::Commit(event)),
                Err(rejection) => planned.push(Planned::Skip(EventReport::new(
                    candidate.title.trim(),
                    CommitOutcome::skipped(rejection.skip_reason()),
                ))),
            }
        }

        // Access negotiation can prompt the user, so it only happens when
        // at least one event will be written.
        if planned.iter().any(|p| matches!(p, Planned::Commit(_))) {
            state.advance(Stage::CommitRequested);
            if let Err(err) = self.gateway.ensure_access().await {
                return Err(state.fail(err.into()));
            }
            state.advance(Stage::Committing);
        }

        for plan in planned {
            match plan {
                Planned::Commit(event) => {
                    let outcome = match self.gateway.commit(&event).await {
                        Ok(outcome) => outcome,
                        Err(err) => return Err(state.fail(err.into())),
                    };
                    report.push(EventReport::new(&event.title, outcome).with_start(event.start));
                }
                Planned::Skip(entry) => report.push(entry),
            }
        }

        state.advance(Stage::Done);
        info!(
            entries = report.len(),
            added = report.added(),
            skipped = report.skipped(),
            failed = report.failed(),
            "run finished"
        );
        Ok(report)
    }

    /// Lists the calendars the store exposes.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] when access is denied or the store fails.
    pub async fn list_calendars(&self) -> RunResult<Vec<CalendarInfo>> {
        self.gateway.list_calendars().await.map_err(RunError::from)
    }

    /// Sends a trivial prompt to verify the model is reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] when the model fails after retries.
    pub async fn check_model(&self) -> RunResult<String> {
        let request = self
            .config
            .model
            .completion_request("Reply with the single word \"ok\".");
        let reply = complete_with_retry(self.backend.as_ref(), &request, &self.config.retry)
            .await
            .map_err(RunError::from)?;
        Ok(reply.trim().to_string())
    }
}

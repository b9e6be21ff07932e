//! Per-run outcome reporting.
//!
//! Every candidate the parser produced ends up as exactly one
//! [`EventReport`] in the final [`RunReport`], in extraction order. Nothing
//! is silently dropped: rejected candidates, duplicates and commit failures
//! all get an entry with their reason.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// Why a candidate was skipped rather than committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An event with the same title starts within tolerance of this one.
    Duplicate,
    /// The stated start time could not be resolved to an instant.
    UnparsableStart,
    /// The candidate had no usable title.
    MissingTitle,
}

impl SkipReason {
    /// Returns a human-readable name for this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::UnparsableStart => "unparsable start time",
            Self::MissingTitle => "missing title",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fate of one candidate event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The event was written to the calendar store.
    Added {
        /// Store-assigned identifier of the new event.
        event_id: String,
    },
    /// The event was deliberately not written.
    Skipped {
        /// Why the event was skipped.
        reason: SkipReason,
    },
    /// The store rejected the write.
    Failed {
        /// Description of the store error.
        error: String,
    },
}

impl CommitOutcome {
    /// Creates an `Added` outcome.
    pub fn added(event_id: impl Into<String>) -> Self {
        Self::Added {
            event_id: event_id.into(),
        }
    }

    /// Creates a `Skipped` outcome.
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// Creates a `Failed` outcome.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Returns true if the event was added.
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added { .. })
    }

    /// Returns true if the event was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Returns true if the commit failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One line of the final report: a candidate and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReport {
    /// The candidate title, possibly empty for title-less candidates.
    pub title: String,
    /// The resolved start, when normalization got that far.
    pub start: Option<EventTime>,
    /// What happened to the candidate.
    pub outcome: CommitOutcome,
}

impl EventReport {
    /// Creates a report entry.
    pub fn new(title: impl Into<String>, outcome: CommitOutcome) -> Self {
        Self {
            title: title.into(),
            start: None,
            outcome,
        }
    }

    /// Records the resolved start.
    pub fn with_start(mut self, start: EventTime) -> Self {
        self.start = Some(start);
        self
    }
}

/// The ordered outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// One entry per candidate, preserving extraction order.
    pub entries: Vec<EventReport>,
    /// Set when the completion had no interpretable event payload.
    pub diagnostic: Option<String>,
}

impl RunReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, preserving insertion order.
    pub fn push(&mut self, entry: EventReport) {
        self.entries.push(entry);
    }

    /// Attaches a parse diagnostic.
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Number of entries in the report.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no candidate produced an entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of events added to the store.
    pub fn added(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_added()).count()
    }

    /// Number of candidates skipped.
    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_skipped())
            .count()
    }

    /// Number of candidates whose commit failed.
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_failed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(title: &str, outcome: CommitOutcome) -> EventReport {
        EventReport::new(title, outcome)
            .with_start(EventTime::from_utc(
                Utc.with_ymd_and_hms(2026, 8, 28, 10, 0, 0).unwrap(),
            ))
    }

    #[test]
    fn skip_reason_names() {
        assert_eq!(SkipReason::Duplicate.as_str(), "duplicate");
        assert_eq!(SkipReason::UnparsableStart.as_str(), "unparsable start time");
        assert_eq!(SkipReason::MissingTitle.as_str(), "missing title");
    }

    #[test]
    fn outcome_predicates() {
        assert!(CommitOutcome::added("evt-1").is_added());
        assert!(CommitOutcome::skipped(SkipReason::Duplicate).is_skipped());
        assert!(CommitOutcome::failed("server error").is_failed());
        assert!(!CommitOutcome::added("evt-1").is_failed());
    }

    #[test]
    fn report_counts() {
        let mut report = RunReport::new();
        report.push(entry("Team meeting", CommitOutcome::added("evt-1")));
        report.push(entry(
            "Team meeting",
            CommitOutcome::skipped(SkipReason::Duplicate),
        ));
        report.push(entry("Budget review", CommitOutcome::failed("410 gone")));

        assert_eq!(report.len(), 3);
        assert_eq!(report.added(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn empty_report_with_diagnostic() {
        let report = RunReport::new().with_diagnostic("no structured events in completion");
        assert!(report.is_empty());
        assert_eq!(
            report.diagnostic.as_deref(),
            Some("no structured events in completion")
        );
    }

    #[test]
    fn order_is_preserved() {
        let mut report = RunReport::new();
        for title in ["first", "second", "third"] {
            report.push(EventReport::new(title, CommitOutcome::added(title)));
        }
        let titles: Vec<&str> = report.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn outcome_serde_shape() {
        let json = serde_json::to_string(&CommitOutcome::skipped(SkipReason::Duplicate)).unwrap();
        assert_eq!(json, r#"{"outcome":"skipped","reason":"duplicate"}"#);

        let parsed: CommitOutcome =
            serde_json::from_str(r#"{"outcome":"added","event_id":"evt-9"}"#).unwrap();
        assert_eq!(parsed, CommitOutcome::added("evt-9"));
    }
}

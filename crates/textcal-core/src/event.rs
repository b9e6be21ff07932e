//! Event types flowing through the extraction pipeline.
//!
//! This module provides the two event representations:
//! - [`CandidateEvent`]: an unvalidated proposal straight from a model
//!   completion, with times still in whatever form the model wrote them
//! - [`NormalizedEvent`]: a fully resolved event with absolute times,
//!   ready to commit to a calendar store

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// An event proposal exactly as the model stated it.
///
/// Field names match the JSON schema the prompt asks the model to emit.
/// Times are verbatim strings and may be natural language ("tomorrow 2pm"),
/// so nothing here is trusted until normalization. Candidates are created by
/// the response parser and consumed (never mutated) by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvent {
    /// The event title. Empty when the model omitted it; rejected later.
    #[serde(default)]
    pub title: String,
    /// Longer description, if the model provided one.
    #[serde(default)]
    pub description: Option<String>,
    /// The stated start, verbatim. Empty when the model omitted it.
    #[serde(default)]
    pub start_time: String,
    /// The stated end, verbatim, if any.
    #[serde(default)]
    pub end_time: Option<String>,
    /// The stated location, if any.
    #[serde(default)]
    pub location: Option<String>,
    /// Whether the model marked this as an all-day event.
    #[serde(default)]
    pub all_day: bool,
}

impl CandidateEvent {
    /// Creates a candidate with the given title and start text.
    pub fn new(title: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_time: start_time.into(),
            end_time: None,
            location: None,
            all_day: false,
        }
    }

    /// Sets the stated end text.
    pub fn with_end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    /// Sets the stated location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the candidate as an all-day event.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }
}

/// A fully resolved event ready for commit.
///
/// Times are absolute: wall-clock text from the candidate has been projected
/// through `timezone` into UTC instants (or plain dates for all-day events).
/// The start < end invariant is established by the normalizer and holds for
/// every value of this type it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// The event title, non-empty.
    pub title: String,
    /// Resolved start of the event.
    pub start: EventTime,
    /// Resolved end, strictly after `start`.
    pub end: EventTime,
    /// The IANA timezone used to resolve wall-clock text.
    pub timezone: Tz,
    /// The event location, if any.
    pub location: Option<String>,
    /// The event description, if any.
    pub description: Option<String>,
    /// Reminder offset in minutes before the start, if configured.
    pub reminder_minutes: Option<u32>,
    /// Target calendar name. `None` means the store's default calendar.
    pub calendar_name: Option<String>,
}

impl NormalizedEvent {
    /// Builds an event from the required fields; optional ones start empty.
    pub fn new(title: impl Into<String>, start: EventTime, end: EventTime, timezone: Tz) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            timezone,
            location: None,
            description: None,
            reminder_minutes: None,
            calendar_name: None,
        }
    }

    /// An event is all-day when its start is a plain date.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Minutes between start and end.
    ///
    /// All-day events count whole days at midnight UTC.
    pub fn duration_minutes(&self) -> i64 {
        (self.end.instant() - self.start.instant()).num_minutes()
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the reminder offset in minutes before the start.
    pub fn with_reminder_minutes(mut self, minutes: u32) -> Self {
        self.reminder_minutes = Some(minutes);
        self
    }

    /// Targets a named calendar instead of the store default.
    pub fn with_calendar_name(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn on(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod candidate_event {
        use super::*;

        #[test]
        fn starts_from_title_and_start_text() {
            let candidate = CandidateEvent::new("Team meeting", "Friday at 10 AM");
            assert_eq!(candidate.title, "Team meeting");
            assert_eq!(candidate.start_time, "Friday at 10 AM");
            assert!(candidate.end_time.is_none());
            assert!(!candidate.all_day);
        }

        #[test]
        fn optional_fields_attach() {
            let candidate = CandidateEvent::new("Offsite", "2026-09-03")
                .with_end_time("2026-09-04")
                .with_location("Lisbon")
                .with_description("Annual planning")
                .with_all_day(true);

            assert_eq!(candidate.end_time.as_deref(), Some("2026-09-04"));
            assert_eq!(candidate.location.as_deref(), Some("Lisbon"));
            assert_eq!(candidate.description.as_deref(), Some("Annual planning"));
            assert!(candidate.all_day);
        }

        #[test]
        fn decodes_model_schema() {
            let json = r#"{
                "title": "Dentist",
                "description": null,
                "start_time": "2026-09-01T09:30:00",
                "end_time": null,
                "location": "Main St clinic",
                "all_day": false
            }"#;
            let candidate: CandidateEvent = serde_json::from_str(json).unwrap();
            assert_eq!(candidate.title, "Dentist");
            assert_eq!(candidate.start_time, "2026-09-01T09:30:00");
            assert_eq!(candidate.location.as_deref(), Some("Main St clinic"));
        }

        #[test]
        fn missing_fields_default() {
            // Models drop fields; absent title/start become empty strings
            // and are rejected downstream instead of failing the decode.
            let candidate: CandidateEvent = serde_json::from_str(r#"{"title": "X"}"#).unwrap();
            assert_eq!(candidate.title, "X");
            assert_eq!(candidate.start_time, "");
            assert!(!candidate.all_day);
        }
    }

    mod normalized_event {
        use super::*;

        fn hour_meeting() -> NormalizedEvent {
            NormalizedEvent::new(
                "Team meeting",
                EventTime::from_utc(at(2026, 8, 28, 10, 0)),
                EventTime::from_utc(at(2026, 8, 28, 11, 0)),
                chrono_tz::UTC,
            )
        }

        #[test]
        fn required_fields_only() {
            let event = hour_meeting();
            assert_eq!(event.title, "Team meeting");
            assert!(!event.is_all_day());
            assert_eq!(event.duration_minutes(), 60);
            assert!(event.calendar_name.is_none());
        }

        #[test]
        fn whole_days_count_in_minutes() {
            let event = NormalizedEvent::new(
                "Conference",
                EventTime::from_date(on(2026, 9, 3)),
                EventTime::from_date(on(2026, 9, 4)),
                chrono_tz::UTC,
            );
            assert!(event.is_all_day());
            assert_eq!(event.duration_minutes(), 24 * 60);
        }

        #[test]
        fn optional_fields_attach() {
            let event = hour_meeting()
                .with_location("conference room")
                .with_description("Quarterly review")
                .with_reminder_minutes(15)
                .with_calendar_name("Work");

            assert_eq!(event.location.as_deref(), Some("conference room"));
            assert_eq!(event.description.as_deref(), Some("Quarterly review"));
            assert_eq!(event.reminder_minutes, Some(15));
            assert_eq!(event.calendar_name.as_deref(), Some("Work"));
        }

        #[test]
        fn timezone_serializes_as_iana_name() {
            let event = NormalizedEvent::new(
                "Standup",
                EventTime::from_utc(at(2026, 8, 24, 13, 0)),
                EventTime::from_utc(at(2026, 8, 24, 13, 15)),
                chrono_tz::America::New_York,
            );
            let json = serde_json::to_string(&event).unwrap();
            assert!(json.contains("\"America/New_York\""));
            let parsed: NormalizedEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, parsed);
        }
    }
}

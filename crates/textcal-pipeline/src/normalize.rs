//! Candidate validation and resolution into committable events.
//!
//! Normalization is where model output stops being trusted text and becomes
//! a real event: the start is resolved against the capture time, a missing
//! or backwards end is replaced by the default duration, and the configured
//! reminder is attached. Candidates without a usable title or start are
//! rejected one by one; a rejection never affects siblings.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{debug, warn};

use textcal_core::{CandidateEvent, EventTime, NormalizedEvent, SkipReason};

use crate::dates::{self, ResolvedTime, resolve_time};

/// Knobs applied while shaping candidates into events.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Timezone wall-clock expressions are resolved in.
    pub timezone: Tz,
    /// Event length when the candidate states no usable end, in minutes.
    pub default_duration_minutes: u32,
    /// Reminder offset before the start, in minutes.
    pub default_reminder_minutes: u32,
}

impl NormalizeConfig {
    /// Default event length in minutes.
    pub const DEFAULT_DURATION_MINUTES: u32 = 60;

    /// Default reminder offset in minutes.
    pub const DEFAULT_REMINDER_MINUTES: u32 = 15;

    /// Creates a configuration for the given timezone with defaults.
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            default_duration_minutes: Self::DEFAULT_DURATION_MINUTES,
            default_reminder_minutes: Self::DEFAULT_REMINDER_MINUTES,
        }
    }

    /// Sets the duration given to events with no usable end.
    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Sets the reminder offset stamped on every event.
    pub fn with_default_reminder(mut self, minutes: u32) -> Self {
        self.default_reminder_minutes = minutes;
        self
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

/// Why a candidate was rejected instead of becoming an event.
///
/// Rejections are per-candidate and end up as skipped report entries, never
/// as run failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationRejection {
    /// The title is missing or whitespace.
    #[error("candidate has no usable title")]
    MissingTitle,
    /// The stated start could not be resolved to a date or instant.
    #[error("start time {0:?} could not be resolved")]
    UnparsableStart(String),
}

impl NormalizationRejection {
    /// Maps the rejection onto the report's skip vocabulary.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::MissingTitle => SkipReason::MissingTitle,
            Self::UnparsableStart(_) => SkipReason::UnparsableStart,
        }
    }
}

/// Shapes one candidate into a committable event.
///
/// `now` anchors relative expressions ("tomorrow", "Friday at 10 AM").
/// Timed events with no end, or an end at or before the start, get the
/// configured default duration. All-day events span whole dates with an
/// exclusive end. The configured reminder is always attached; candidates
/// never carry one.
///
/// # Errors
///
/// Returns a [`NormalizationRejection`] for an empty title or an
/// unresolvable start expression.
pub fn normalize(
    candidate: &CandidateEvent,
    now: DateTime<Utc>,
    config: &NormalizeConfig,
) -> Result<NormalizedEvent, NormalizationRejection> {
    let title = candidate.title.trim();
    if title.is_empty() {
        warn!(start = %candidate.start_time, "dropping candidate without a title");
        return Err(NormalizationRejection::MissingTitle);
    }

    let tz = config.timezone;
    let start = resolve_time(&candidate.start_time, now, tz).ok_or_else(|| {
        warn!(
            title = %title,
            start = %candidate.start_time,
            "dropping candidate with unresolvable start"
        );
        NormalizationRejection::UnparsableStart(candidate.start_time.clone())
    })?;

    let end = candidate
        .end_time
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .and_then(|text| {
            let resolved = resolve_time(text, now, tz);
            if resolved.is_none() {
                warn!(title = %title, end = %text, "ignoring unresolvable end time");
            }
            resolved
        });

    let event = if candidate.all_day {
        build_all_day(title, start, end, tz)
    } else {
        build_timed(title, start, end, config)?
    };

    let mut event = event.with_reminder_minutes(config.default_reminder_minutes);
    if let Some(location) = trimmed_field(candidate.location.as_deref()) {
        event = event.with_location(location);
    }
    if let Some(description) = trimmed_field(candidate.description.as_deref()) {
        event = event.with_description(description);
    }

    debug!(
        title = %event.title,
        all_day = event.is_all_day(),
        minutes = event.duration_minutes(),
        "normalized candidate"
    );
    Ok(event)
}

/// Builds an all-day event spanning whole dates, end exclusive.
///
/// An end that does not land after the start date, or no end at all, covers
/// a single day.
fn build_all_day(
    title: &str,
    start: ResolvedTime,
    end: Option<ResolvedTime>,
    tz: Tz,
) -> NormalizedEvent {
    let start_date = start.date_in(&tz);
    let end_date = match end.map(|resolved| resolved.date_in(&tz)) {
        Some(date) if date > start_date => date,
        _ => start_date.succ_opt().expect("valid successor date"),
    };
    NormalizedEvent::new(
        title,
        EventTime::from_date(start_date),
        EventTime::from_date(end_date),
        tz,
    )
}

/// Builds a timed event, deriving the end from the default duration when
/// the candidate gave none that follows the start.
fn build_timed(
    title: &str,
    start: ResolvedTime,
    end: Option<ResolvedTime>,
    config: &NormalizeConfig,
) -> Result<NormalizedEvent, NormalizationRejection> {
    let tz = config.timezone;
    let start_utc = match start {
        ResolvedTime::Instant(utc) => utc,
        // A bare date on a timed event means midnight, which some zones
        // skip on transition days.
        ResolvedTime::Date(date) => {
            dates::project(tz, date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
                .ok_or_else(|| NormalizationRejection::UnparsableStart(date.to_string()))?
        }
    };

    // A positive duration keeps start strictly before end.
    let duration = Duration::minutes(i64::from(config.default_duration_minutes.max(1)));
    let end_utc = match end {
        Some(ResolvedTime::Instant(utc)) if utc > start_utc => utc,
        Some(ResolvedTime::Instant(_)) => {
            debug!(title = %title, "end does not follow start, applying default duration");
            start_utc + duration
        }
        // A bare end date says nothing useful about a timed event.
        Some(ResolvedTime::Date(_)) | None => start_utc + duration,
    };

    Ok(NormalizedEvent::new(
        title,
        EventTime::from_utc(start_utc),
        EventTime::from_utc(end_utc),
        tz,
    ))
}

fn trimmed_field(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    /// 2026-08-24 was a Monday.
    fn monday_anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn config() -> NormalizeConfig {
        NormalizeConfig::default()
    }

    fn run(candidate: &CandidateEvent) -> NormalizedEvent {
        normalize(candidate, monday_anchor(), &config()).unwrap()
    }

    mod rejections {
        use super::*;

        #[test]
        fn empty_title() {
            for title in ["", "   "] {
                let candidate = CandidateEvent::new(title, "2026-08-28T10:00:00");
                let rejection = normalize(&candidate, monday_anchor(), &config()).unwrap_err();
                assert_eq!(rejection, NormalizationRejection::MissingTitle);
                assert_eq!(rejection.skip_reason(), SkipReason::MissingTitle);
            }
        }

        #[test]
        fn unresolvable_start() {
            let candidate = CandidateEvent::new("Team meeting", "whenever suits everyone");
            let rejection = normalize(&candidate, monday_anchor(), &config()).unwrap_err();
            assert_eq!(
                rejection,
                NormalizationRejection::UnparsableStart("whenever suits everyone".to_string())
            );
            assert_eq!(rejection.skip_reason(), SkipReason::UnparsableStart);
        }

        #[test]
        fn empty_start() {
            let candidate = CandidateEvent::new("Team meeting", "");
            assert!(normalize(&candidate, monday_anchor(), &config()).is_err());
        }
    }

    mod timed {
        use super::*;

        #[test]
        fn default_duration_when_no_end() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00"));
            assert_eq!(event.start, EventTime::from_utc(utc(2026, 8, 28, 10, 0)));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 8, 28, 11, 0)));
            assert_eq!(event.duration_minutes(), 60);
        }

        #[test]
        fn explicit_end_is_kept() {
            let event = run(&CandidateEvent::new("Workshop", "2026-08-28T10:00:00")
                .with_end_time("2026-08-28T12:30:00"));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 8, 28, 12, 30)));
        }

        #[test]
        fn end_before_start_gets_default_duration() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00")
                .with_end_time("2026-08-28T09:00:00"));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 8, 28, 11, 0)));
        }

        #[test]
        fn end_equal_to_start_gets_default_duration() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00")
                .with_end_time("2026-08-28T10:00:00"));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 8, 28, 11, 0)));
        }

        #[test]
        fn unresolvable_end_is_ignored() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00")
                .with_end_time("until we are finished"));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 8, 28, 11, 0)));
        }

        #[test]
        fn weekday_phrase_resolves_against_the_anchor() {
            let event = run(&CandidateEvent::new("Team meeting", "Friday at 10 AM")
                .with_location("conference room"));
            assert_eq!(event.start, EventTime::from_utc(utc(2026, 8, 28, 10, 0)));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 8, 28, 11, 0)));
            assert_eq!(event.location.as_deref(), Some("conference room"));
        }

        #[test]
        fn wall_clock_is_projected_through_the_timezone() {
            let config = NormalizeConfig::new(chrono_tz::America::New_York);
            let candidate = CandidateEvent::new("Call", "2026-08-28T10:00:00");
            let event = normalize(&candidate, monday_anchor(), &config).unwrap();
            // New York is UTC-4 in August.
            assert_eq!(event.start, EventTime::from_utc(utc(2026, 8, 28, 14, 0)));
            assert_eq!(event.timezone, chrono_tz::America::New_York);
        }

        #[test]
        fn bare_date_without_all_day_starts_at_midnight() {
            let event = run(&CandidateEvent::new("Release", "2026-09-03"));
            assert_eq!(event.start, EventTime::from_utc(utc(2026, 9, 3, 0, 0)));
            assert_eq!(event.end, EventTime::from_utc(utc(2026, 9, 3, 1, 0)));
            assert!(!event.is_all_day());
        }

        #[test]
        fn custom_duration() {
            let config = NormalizeConfig::default().with_default_duration(30);
            let candidate = CandidateEvent::new("Standup", "2026-08-28T10:00:00");
            let event = normalize(&candidate, monday_anchor(), &config).unwrap();
            assert_eq!(event.duration_minutes(), 30);
        }

        #[test]
        fn start_always_precedes_end() {
            let adversarial = [
                CandidateEvent::new("A", "2026-08-28T10:00:00"),
                CandidateEvent::new("B", "2026-08-28T10:00:00").with_end_time("2026-08-28T08:00:00"),
                CandidateEvent::new("C", "tomorrow at 9 AM").with_end_time("yesterday"),
                CandidateEvent::new("D", "2026-09-03").with_end_time("2026-09-01"),
            ];
            for candidate in &adversarial {
                let event = normalize(candidate, monday_anchor(), &config()).unwrap();
                assert!(
                    event.start.instant() < event.end.instant(),
                    "start must precede end for {:?}",
                    candidate.title
                );
            }
        }
    }

    mod all_day {
        use super::*;

        fn date(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        #[test]
        fn single_day() {
            let event = run(&CandidateEvent::new("Offsite", "2026-09-03").with_all_day(true));
            assert!(event.is_all_day());
            assert_eq!(event.start, EventTime::from_date(date(2026, 9, 3)));
            assert_eq!(event.end, EventTime::from_date(date(2026, 9, 4)));
        }

        #[test]
        fn explicit_end_date_is_kept() {
            let event = run(&CandidateEvent::new("Conference", "2026-09-03")
                .with_end_time("2026-09-05")
                .with_all_day(true));
            assert_eq!(event.end, EventTime::from_date(date(2026, 9, 5)));
        }

        #[test]
        fn end_not_after_start_covers_one_day() {
            let event = run(&CandidateEvent::new("Offsite", "2026-09-03")
                .with_end_time("2026-09-03")
                .with_all_day(true));
            assert_eq!(event.end, EventTime::from_date(date(2026, 9, 4)));
        }

        #[test]
        fn instant_start_keeps_its_local_date() {
            // 23:00 in New York on the 3rd is already the 4th in UTC.
            let config = NormalizeConfig::new(chrono_tz::America::New_York);
            let candidate =
                CandidateEvent::new("Holiday", "2026-09-03T23:00:00").with_all_day(true);
            let event = normalize(&candidate, monday_anchor(), &config).unwrap();
            assert_eq!(event.start, EventTime::from_date(date(2026, 9, 3)));
            assert_eq!(event.end, EventTime::from_date(date(2026, 9, 4)));
        }
    }

    mod details {
        use super::*;

        #[test]
        fn reminder_comes_from_config() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00"));
            assert_eq!(event.reminder_minutes, Some(15));

            let config = NormalizeConfig::default().with_default_reminder(0);
            let candidate = CandidateEvent::new("Standup", "2026-08-28T10:00:00");
            let event = normalize(&candidate, monday_anchor(), &config).unwrap();
            assert_eq!(event.reminder_minutes, Some(0));
        }

        #[test]
        fn fields_are_trimmed() {
            let event = run(&CandidateEvent::new("  Team meeting  ", "2026-08-28T10:00:00")
                .with_location("  conference room ")
                .with_description(" Quarterly review "));
            assert_eq!(event.title, "Team meeting");
            assert_eq!(event.location.as_deref(), Some("conference room"));
            assert_eq!(event.description.as_deref(), Some("Quarterly review"));
        }

        #[test]
        fn blank_fields_become_none() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00")
                .with_location("   ")
                .with_description(""));
            assert!(event.location.is_none());
            assert!(event.description.is_none());
        }

        #[test]
        fn calendar_is_left_to_the_gateway() {
            let event = run(&CandidateEvent::new("Standup", "2026-08-28T10:00:00"));
            assert!(event.calendar_name.is_none());
        }
    }
}

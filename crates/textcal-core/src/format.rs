//! Plain-text rendering of run reports.
//!
//! The CLI prints one line per candidate plus a summary line. Rendering is
//! deterministic for a given timezone, which keeps the output snapshot-
//! testable.

use chrono_tz::Tz;

use crate::report::{CommitOutcome, RunReport};
use crate::time::EventTime;

/// Formats an event time for display in the given timezone.
pub fn format_event_time(time: &EventTime, tz: Tz) -> String {
    match time {
        EventTime::DateTime(dt) => dt
            .with_timezone(&tz)
            .format("%a %Y-%m-%d %H:%M")
            .to_string(),
        EventTime::AllDay(date) => format!("{} (all day)", date.format("%a %Y-%m-%d")),
    }
}

/// Renders a run report as terminal text.
///
/// One line per entry in extraction order, then a summary. An empty report
/// renders as a distinct "no events" notice so callers can tell it apart
/// from failure output.
pub fn render_report(report: &RunReport, tz: Tz) -> String {
    let mut out = String::new();
    for entry in &report.entries {
        let title = if entry.title.trim().is_empty() {
            "(untitled)"
        } else {
            entry.title.trim()
        };
        let when = entry
            .start
            .as_ref()
            .map(|start| format_event_time(start, tz))
            .unwrap_or_else(|| "unscheduled".to_string());
        let line = match &entry.outcome {
            CommitOutcome::Added { .. } => format!("added    {title}  {when}"),
            CommitOutcome::Skipped { reason } => {
                format!("skipped  {title}  {when}  ({reason})")
            }
            CommitOutcome::Failed { error } => {
                format!("failed   {title}  {when}  ({error})")
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    if report.is_empty() {
        out.push_str("No events found.\n");
    } else {
        out.push_str(&format!(
            "{} added, {} skipped, {} failed\n",
            report.added(),
            report.skipped(),
            report.failed()
        ));
    }
    if let Some(diagnostic) = &report.diagnostic {
        out.push_str(&format!("note: {diagnostic}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{EventReport, SkipReason};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn timed_entry(title: &str, outcome: CommitOutcome) -> EventReport {
        EventReport::new(title, outcome).with_start(EventTime::from_utc(utc(2026, 8, 28, 10, 0, 0)))
    }

    #[test]
    fn event_time_formatting() {
        let timed = EventTime::from_utc(utc(2026, 8, 28, 10, 0, 0));
        assert_eq!(format_event_time(&timed, chrono_tz::UTC), "Fri 2026-08-28 10:00");

        // Same instant shown as local wall-clock time.
        assert_eq!(
            format_event_time(&timed, chrono_tz::Europe::Paris),
            "Fri 2026-08-28 12:00"
        );

        let all_day = EventTime::from_date(NaiveDate::from_ymd_opt(2026, 9, 3).unwrap());
        assert_eq!(
            format_event_time(&all_day, chrono_tz::UTC),
            "Thu 2026-09-03 (all day)"
        );
    }

    #[test]
    fn mixed_report() {
        let mut report = RunReport::new();
        report.push(timed_entry("Team meeting", CommitOutcome::added("evt-1")));
        report.push(timed_entry(
            "Team meeting",
            CommitOutcome::skipped(SkipReason::Duplicate),
        ));
        report.push(
            EventReport::new("Budget review", CommitOutcome::failed("server error"))
                .with_start(EventTime::from_utc(utc(2026, 8, 28, 12, 0, 0))),
        );

        insta::assert_snapshot!(render_report(&report, chrono_tz::UTC), @r"
        added    Team meeting  Fri 2026-08-28 10:00
        skipped  Team meeting  Fri 2026-08-28 10:00  (duplicate)
        failed   Budget review  Fri 2026-08-28 12:00  (server error)
        1 added, 1 skipped, 1 failed
        ");
    }

    #[test]
    fn empty_report_with_note() {
        let report = RunReport::new().with_diagnostic("completion contained no event list");

        insta::assert_snapshot!(render_report(&report, chrono_tz::UTC), @r"
        No events found.
        note: completion contained no event list
        ");
    }

    #[test]
    fn untitled_and_all_day_entries() {
        let mut report = RunReport::new();
        report.push(
            EventReport::new("Conference", CommitOutcome::added("evt-2")).with_start(
                EventTime::from_date(NaiveDate::from_ymd_opt(2026, 9, 3).unwrap()),
            ),
        );
        report.push(EventReport::new(
            "  ",
            CommitOutcome::skipped(SkipReason::MissingTitle),
        ));

        insta::assert_snapshot!(render_report(&report, chrono_tz::UTC), @r"
        added    Conference  Thu 2026-09-03 (all day)
        skipped  (untitled)  unscheduled  (missing title)
        1 added, 1 skipped, 0 failed
        ");
    }
}

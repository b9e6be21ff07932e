//! Date and time resolution for candidate events.
//!
//! The prompt asks the model for ISO 8601, but completions regularly carry
//! whatever phrasing the source text used ("Friday at 10 AM", "tomorrow").
//! [`resolve_time`] accepts both: explicit formats are tried first, then a
//! small natural-language vocabulary anchored at the capture time. Anything
//! else resolves to nothing and is rejected downstream.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// Wall-clock hour used for "tonight" when no clock time follows.
const TONIGHT_HOUR: u32 = 20;

/// Formats without an offset, resolved as wall-clock time in the configured
/// timezone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A resolved date/time expression.
///
/// A bare date stays a date so the normalizer can shape all-day events from
/// it; everything else becomes a UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTime {
    /// A specific point in time.
    Instant(DateTime<Utc>),
    /// A date with no time of day.
    Date(NaiveDate),
}

impl ResolvedTime {
    /// Returns the date portion, instants taken in the given timezone.
    pub fn date_in(&self, tz: &Tz) -> NaiveDate {
        match self {
            Self::Instant(utc) => utc.with_timezone(tz).date_naive(),
            Self::Date(date) => *date,
        }
    }
}

/// Resolves a date/time expression to an absolute value.
///
/// Accepted forms, in the order they are tried:
/// - RFC 3339 (`2026-08-28T10:00:00Z`, `2026-08-28T10:00:00+02:00`)
/// - ISO date and time without offset, `T`- or space-separated, seconds
///   optional; read as wall-clock time in `tz`
/// - bare `YYYY-MM-DD`, kept as a date
/// - `today` / `tomorrow` / `tonight`, weekday names with an optional
///   leading `next`, and clock times (`10 AM`, `10:30pm`, `14:00`,
///   `noon`, `midnight`), alone or combined
///
/// Ambiguous phrases resolve to the next occurrence on or after `now`: a
/// weekday names the current or upcoming such day, and a bare clock time
/// that already passed today means tomorrow. `today`, `tomorrow` and
/// `tonight` pin the day and never roll forward.
pub fn resolve_time(text: &str, now: DateTime<Utc>, tz: Tz) -> Option<ResolvedTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ResolvedTime::Instant(dt.with_timezone(&Utc)));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return project(tz, naive).map(ResolvedTime::Instant);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(ResolvedTime::Date(date));
    }

    resolve_phrase(trimmed, now.with_timezone(&tz))
}

/// Projects a wall-clock time into UTC through the given timezone.
///
/// An ambiguous time (clocks rolled back) takes the earlier instant; a time
/// inside a spring-forward gap does not exist and resolves to nothing.
pub(crate) fn project(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    use chrono::TimeZone;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Words skipped during phrase tokenization.
fn is_filler(token: &str) -> bool {
    matches!(token, "at" | "on" | "the")
}

fn resolve_phrase(text: &str, local_now: DateTime<Tz>) -> Option<ResolvedTime> {
    let tz = local_now.timezone();
    let today = local_now.date_naive();

    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| matches!(c, ',' | '.')))
        .filter(|token| !token.is_empty() && !is_filler(token))
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let mut index = 0;
    let mut date: Option<NaiveDate> = None;
    let mut weekday_phrase = false;
    let mut evening = false;

    match tokens[0] {
        "today" => {
            date = Some(today);
            index = 1;
        }
        "tomorrow" => {
            date = Some(today + Duration::days(1));
            index = 1;
        }
        "tonight" => {
            date = Some(today);
            evening = true;
            index = 1;
        }
        "next" => {
            if let Some(target) = tokens.get(1).and_then(|t| parse_weekday(t)) {
                date = Some(weekday_on_or_after(today, target));
                weekday_phrase = true;
                index = 2;
            }
        }
        first => {
            if let Some(target) = parse_weekday(first) {
                date = Some(weekday_on_or_after(today, target));
                weekday_phrase = true;
                index = 1;
            }
        }
    }

    let clock = if index < tokens.len() {
        Some(parse_clock(&tokens[index..].concat())?)
    } else {
        None
    };

    match (date, clock) {
        (Some(date), None) if evening => {
            let naive = date.and_hms_opt(TONIGHT_HOUR, 0, 0)?;
            project(tz, naive).map(ResolvedTime::Instant)
        }
        (Some(date), None) => Some(ResolvedTime::Date(date)),
        (date_part, Some(clock)) => {
            // A weekday or a bare clock time is ambiguous: it means the
            // next such instant on or after now.
            let ambiguous = weekday_phrase || date_part.is_none();
            let date = date_part.unwrap_or(today);
            let mut instant = project(tz, date.and_time(clock))?;
            if ambiguous && instant < local_now.with_timezone(&Utc) {
                let step = if weekday_phrase {
                    Duration::days(7)
                } else {
                    Duration::days(1)
                };
                instant = project(tz, (date + step).and_time(clock))?;
            }
            Some(ResolvedTime::Instant(instant))
        }
        (None, None) => None,
    }
}

/// Parses a clock expression: `noon`, `midnight`, 12-hour forms with an
/// `am`/`pm` suffix, or 24-hour `HH:MM[:SS]`.
///
/// The input is lowercase with inter-token whitespace already removed, so
/// "10 AM" arrives as "10am". Bare numbers without a meridiem or colon stay
/// unparsed; "10" alone says nothing about the time of day.
fn parse_clock(s: &str) -> Option<NaiveTime> {
    match s {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let meridiem = |s: &str, pm: bool| -> Option<NaiveTime> {
        let (hour, minute) = match s.split_once(':') {
            Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
            None => (s.parse::<u32>().ok()?, 0),
        };
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        let hour = match (hour, pm) {
            (12, true) => 12,
            (12, false) => 0,
            (hour, true) => hour + 12,
            (hour, false) => hour,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    };

    if let Some(stripped) = s.strip_suffix("am") {
        return meridiem(stripped, false);
    }
    if let Some(stripped) = s.strip_suffix("pm") {
        return meridiem(stripped, true);
    }

    let mut parts = s.split(':');
    let hour = parts.next()?.parse::<u32>().ok()?;
    let minute = parts.next()?.parse::<u32>().ok()?;
    let second = match parts.next() {
        Some(part) => part.parse::<u32>().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    let weekday = match s {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// First date on or after `from` falling on the target weekday.
fn weekday_on_or_after(from: NaiveDate, target: Weekday) -> NaiveDate {
    let ahead =
        (target.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7;
    from + Duration::days(i64::from(ahead))
}

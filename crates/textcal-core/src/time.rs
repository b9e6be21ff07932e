//! Event times and query windows.
//!
//! [`EventTime`] is the one time shape the whole pipeline passes around:
//! either a UTC instant or a bare date for all-day events. [`TimeWindow`]
//! is the query range duplicate detection asks stores about.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// When an event happens.
///
/// Timed events carry a UTC instant; all-day events carry only a date.
/// The distinction survives end to end, a date never silently turns into
/// a midnight instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Wraps a UTC instant.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Converts an instant in any timezone to UTC and wraps it.
    pub fn from_zoned<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::DateTime(dt.with_timezone(&Utc))
    }

    /// Wraps an all-day date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Whether this is an all-day date.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// The date, for all-day values.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::AllDay(d) => Some(*d),
            Self::DateTime(_) => None,
        }
    }

    /// The UTC instant this time compares at.
    ///
    /// All-day dates pin to midnight UTC, which keeps timed and all-day
    /// values comparable inside one window.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc(),
        }
    }
}

/// A half-open UTC interval `[start, end)` for store queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window from explicit bounds.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "window start after end");
        Self { start, end }
    }

    /// A window of `tolerance` on either side of an instant.
    ///
    /// This is the shape duplicate detection uses: an existing event whose
    /// start falls inside `around(candidate_start, tolerance)` is a
    /// potential duplicate of the candidate.
    pub fn around(center: DateTime<Utc>, tolerance: Duration) -> Self {
        Self::new(center - tolerance, center + tolerance)
    }

    /// The length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether an instant falls inside the window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        (self.start..self.end).contains(&dt)
    }

    /// Whether an event time falls inside the window.
    ///
    /// All-day values are checked at midnight UTC.
    pub fn contains_event_time(&self, et: &EventTime) -> bool {
        self.contains(et.instant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod event_time {
        use super::*;

        #[test]
        fn timed_values_keep_their_instant() {
            let dt = at(2026, 8, 28, 10, 0, 0);
            let et = EventTime::from_utc(dt);
            assert!(!et.is_all_day());
            assert_eq!(et.as_date(), None);
            assert_eq!(et.instant(), dt);
        }

        #[test]
        fn all_day_values_keep_their_date() {
            let d = day(2026, 8, 28);
            let et = EventTime::from_date(d);
            assert!(et.is_all_day());
            assert_eq!(et.as_date(), Some(d));
            assert_eq!(et.instant(), at(2026, 8, 28, 0, 0, 0));
        }

        #[test]
        fn from_zoned_converts_to_utc() {
            let tz = chrono_tz::America::New_York;
            let local = tz.with_ymd_and_hms(2026, 8, 28, 10, 0, 0).unwrap();
            let et = EventTime::from_zoned(local);
            // EDT is UTC-4 in August.
            assert_eq!(et.instant(), at(2026, 8, 28, 14, 0, 0));
        }

        #[test]
        fn serde_keeps_the_shape_distinction() {
            let timed = EventTime::from_utc(at(2026, 8, 28, 10, 30, 0));
            let json = serde_json::to_string(&timed).unwrap();
            assert!(json.contains("DateTime"));
            assert_eq!(serde_json::from_str::<EventTime>(&json).unwrap(), timed);

            let all_day = EventTime::from_date(day(2026, 8, 28));
            let json = serde_json::to_string(&all_day).unwrap();
            assert!(json.contains("AllDay"));
            assert_eq!(serde_json::from_str::<EventTime>(&json).unwrap(), all_day);
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn explicit_bounds() {
            let window = TimeWindow::new(at(2026, 8, 24, 9, 0, 0), at(2026, 8, 24, 12, 30, 0));
            assert_eq!(window.duration(), Duration::minutes(210));
        }

        #[test]
        #[should_panic(expected = "window start after end")]
        fn inverted_bounds_panic() {
            TimeWindow::new(at(2026, 8, 24, 12, 30, 0), at(2026, 8, 24, 9, 0, 0));
        }

        #[test]
        fn around_an_instant() {
            let center = at(2026, 8, 28, 10, 0, 0);
            let window = TimeWindow::around(center, Duration::seconds(60));
            assert_eq!(window.start, at(2026, 8, 28, 9, 59, 0));
            assert_eq!(window.end, at(2026, 8, 28, 10, 1, 0));

            // Starts within tolerance are inside, the far edge is not
            // (half-open).
            assert!(window.contains(at(2026, 8, 28, 10, 0, 30)));
            assert!(window.contains(at(2026, 8, 28, 9, 59, 0)));
            assert!(!window.contains(at(2026, 8, 28, 10, 1, 0)));
        }

        #[test]
        fn half_open_boundaries() {
            let window = TimeWindow::new(at(2026, 8, 24, 9, 0, 0), at(2026, 8, 24, 12, 30, 0));

            assert!(window.contains(at(2026, 8, 24, 9, 0, 0)));
            assert!(window.contains(at(2026, 8, 24, 12, 29, 59)));
            assert!(!window.contains(at(2026, 8, 24, 12, 30, 0)));
            assert!(!window.contains(at(2026, 8, 24, 8, 59, 59)));
        }

        #[test]
        fn event_times_of_both_shapes_are_checked() {
            let window = TimeWindow::new(at(2026, 8, 28, 0, 0, 0), at(2026, 8, 29, 0, 0, 0));
            assert!(window.contains_event_time(&EventTime::from_date(day(2026, 8, 28))));
            assert!(window.contains_event_time(&EventTime::from_utc(at(2026, 8, 28, 12, 0, 0))));
            assert!(!window.contains_event_time(&EventTime::from_date(day(2026, 8, 29))));
        }
    }
}

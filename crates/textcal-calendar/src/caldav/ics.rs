//! iCalendar (RFC 5545) conversion.
//!
//! Two directions: parsing calendar-data payloads from REPORT responses
//! into [`StoredEvent`]s, and serializing a [`NormalizedEvent`] into a
//! VCALENDAR document for PUT.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
    Property,
};
use tracing::{debug, warn};

use textcal_core::{EventTime, NormalizedEvent};

use crate::store::StoredEvent;

/// Parses ICS content and extracts events.
///
/// Malformed documents yield an empty list; a single bad payload must not
/// sink the surrounding REPORT response.
pub fn parse_ics_events(ics: &str) -> Vec<StoredEvent> {
    let calendar = match ics.parse::<Calendar>() {
        Ok(cal) => cal,
        Err(e) => {
            warn!(error = %e, "unparseable ics payload, dropping it");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => parse_event(event),
            _ => None,
        })
        .collect()
}

/// Parses a single VEVENT component. Events without a UID are skipped.
fn parse_event(event: &Event) -> Option<StoredEvent> {
    let uid = event.get_uid()?;
    let start = convert_date_time(event.get_start()?);
    let end = event.get_end().map(convert_date_time);

    let title = event.get_summary().unwrap_or_default();

    let mut stored = StoredEvent::new(uid, title, start);
    if let Some(end) = end {
        stored = stored.with_end(end);
    }

    debug!(uid = %stored.id, title = %stored.title, "decoded stored event");

    Some(stored)
}

/// Converts icalendar DatePerhapsTime to EventTime.
///
/// Zoned times are projected through their TZID when it names a known IANA
/// zone, otherwise the wall clock is taken as UTC.
fn convert_date_time(dt: DatePerhapsTime) -> EventTime {
    match dt {
        DatePerhapsTime::Date(date) => EventTime::from_date(date),
        DatePerhapsTime::DateTime(cdt) => match cdt {
            CalendarDateTime::Utc(dt) => EventTime::from_utc(dt),
            CalendarDateTime::Floating(naive) => EventTime::from_utc(Utc.from_utc_datetime(&naive)),
            CalendarDateTime::WithTimezone { date_time, tzid } => match tzid.parse::<Tz>() {
                Ok(tz) => match tz.from_local_datetime(&date_time).single() {
                    Some(zoned) => EventTime::from_zoned(zoned),
                    None => EventTime::from_utc(Utc.from_utc_datetime(&date_time)),
                },
                Err(_) => {
                    warn!(tzid = %tzid, "unrecognized tzid, keeping the wall clock as utc");
                    EventTime::from_utc(Utc.from_utc_datetime(&date_time))
                }
            },
        },
    }
}

/// Serializes a normalized event into a VCALENDAR document.
///
/// Timed events are written as UTC instants, all-day events as VALUE=DATE
/// properties (the normalizer already made the end date exclusive). A
/// reminder becomes a DISPLAY alarm relative to the start.
pub fn build_event_ics(event: &NormalizedEvent, uid: &str) -> String {
    let mut vevent = Event::new();
    vevent.uid(uid);
    vevent.summary(&event.title);
    vevent.timestamp(Utc::now());

    add_time_property(&mut vevent, "DTSTART", &event.start);
    add_time_property(&mut vevent, "DTEND", &event.end);

    if let Some(ref location) = event.location {
        vevent.location(location);
    }
    if let Some(ref description) = event.description {
        vevent.description(description);
    }

    let mut calendar = Calendar::new();
    calendar.push(vevent);
    let mut ics = calendar.to_string();

    // The icalendar builder has no alarm support, splice the VALARM block
    // into the VEVENT by hand.
    if let Some(minutes) = event.reminder_minutes {
        let alarm = format!(
            "BEGIN:VALARM\r\nACTION:DISPLAY\r\nDESCRIPTION:Reminder\r\nTRIGGER:-PT{}M\r\nEND:VALARM\r\n",
            minutes
        );
        if let Some(idx) = ics.rfind("END:VEVENT") {
            ics.insert_str(idx, &alarm);
        }
    }

    ics
}

/// Adds DTSTART or DTEND in the shape matching the event time.
fn add_time_property(vevent: &mut Event, key: &str, time: &EventTime) {
    match time {
        EventTime::DateTime(dt) => {
            let formatted = dt.format("%Y%m%dT%H%M%SZ").to_string();
            vevent.add_property(key, &formatted);
        }
        EventTime::AllDay(date) => {
            let formatted = date.format("%Y%m%d").to_string();
            let mut prop = Property::new(key, &formatted);
            prop.add_parameter("VALUE", "DATE");
            vevent.append_property(prop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timed_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:team-sync-1@example.com\r\n\
         DTSTART:20260828T100000Z\r\n\
         DTEND:20260828T110000Z\r\n\
         SUMMARY:Team meeting\r\n\
         LOCATION:conference room\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    fn all_day_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         BEGIN:VEVENT\r\n\
         UID:offsite-1@example.com\r\n\
         DTSTART;VALUE=DATE:20260903\r\n\
         DTEND;VALUE=DATE:20260904\r\n\
         SUMMARY:Offsite\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    #[test]
    fn parse_timed_event() {
        let events = parse_ics_events(timed_ics());

        assert_eq!(events.len(), 1);
        let event = &events[0];

        assert_eq!(event.id, "team-sync-1@example.com");
        assert_eq!(event.title, "Team meeting");
        assert_eq!(
            event.start.instant(),
            Utc.with_ymd_and_hms(2026, 8, 28, 10, 0, 0).unwrap()
        );
        assert!(!event.start.is_all_day());
        assert!(event.end.is_some());
    }

    #[test]
    fn parse_all_day_event() {
        let events = parse_ics_events(all_day_ics());

        assert_eq!(events.len(), 1);
        let event = &events[0];

        assert_eq!(event.title, "Offsite");
        assert!(event.start.is_all_day());
        assert_eq!(
            event.start.as_date(),
            Some(NaiveDate::from_ymd_opt(2026, 9, 3).unwrap())
        );
    }

    #[test]
    fn parse_event_with_tzid() {
        let ics = "BEGIN:VCALENDAR\r\n\
            VERSION:2.0\r\n\
            BEGIN:VEVENT\r\n\
            UID:zoned-1@example.com\r\n\
            DTSTART;TZID=America/New_York:20260828T100000\r\n\
            SUMMARY:East coast call\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR";

        let events = parse_ics_events(ics);

        assert_eq!(events.len(), 1);
        // EDT is UTC-4 in August.
        assert_eq!(
            events[0].start.instant(),
            Utc.with_ymd_and_hms(2026, 8, 28, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn garbage_input_yields_no_events() {
        assert!(parse_ics_events("this is not an icalendar document").is_empty());
    }

    #[test]
    fn event_without_uid_is_skipped() {
        let ics = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART:20260828T100000Z\r\n\
            SUMMARY:No identity\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR";

        assert!(parse_ics_events(ics).is_empty());
    }

    #[test]
    fn build_timed_event() {
        let event = NormalizedEvent::new(
            "Team meeting",
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 8, 28, 10, 0, 0).unwrap()),
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 8, 28, 11, 0, 0).unwrap()),
            chrono_tz::UTC,
        )
        .with_location("conference room");

        let ics = build_event_ics(&event, "new-uid-1");

        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("UID:new-uid-1"));
        assert!(ics.contains("SUMMARY:Team meeting"));
        assert!(ics.contains("DTSTART:20260828T100000Z"));
        assert!(ics.contains("DTEND:20260828T110000Z"));
        assert!(ics.contains("LOCATION:conference room"));
        assert!(!ics.contains("BEGIN:VALARM"));
    }

    #[test]
    fn build_all_day_event() {
        let event = NormalizedEvent::new(
            "Offsite",
            EventTime::from_date(NaiveDate::from_ymd_opt(2026, 9, 3).unwrap()),
            EventTime::from_date(NaiveDate::from_ymd_opt(2026, 9, 4).unwrap()),
            chrono_tz::UTC,
        );

        let ics = build_event_ics(&event, "new-uid-2");

        assert!(ics.contains("DTSTART;VALUE=DATE:20260903"));
        assert!(ics.contains("DTEND;VALUE=DATE:20260904"));
    }

    #[test]
    fn build_event_with_reminder() {
        let event = NormalizedEvent::new(
            "Dentist",
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 9, 1, 9, 30, 0).unwrap()),
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 9, 1, 10, 30, 0).unwrap()),
            chrono_tz::UTC,
        )
        .with_reminder_minutes(15);

        let ics = build_event_ics(&event, "new-uid-3");

        assert!(ics.contains("BEGIN:VALARM"));
        assert!(ics.contains("TRIGGER:-PT15M"));
        assert!(ics.contains("ACTION:DISPLAY"));
        // The alarm sits inside the event.
        let alarm_pos = ics.find("BEGIN:VALARM").unwrap();
        let event_end_pos = ics.find("END:VEVENT").unwrap();
        assert!(alarm_pos < event_end_pos);
    }

    #[test]
    fn built_ics_round_trips_through_parser() {
        let event = NormalizedEvent::new(
            "Planning",
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 9, 3, 14, 0, 0).unwrap()),
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 9, 3, 15, 0, 0).unwrap()),
            chrono_tz::UTC,
        );

        let ics = build_event_ics(&event, "round-trip-uid");
        let parsed = parse_ics_events(&ics);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "round-trip-uid");
        assert_eq!(parsed[0].title, "Planning");
        assert_eq!(parsed[0].start, event.start);
        assert_eq!(parsed[0].end, Some(event.end));
    }
}

//! Request bodies and multistatus parsing for the WebDAV dialogue.
//!
//! The request bodies are fixed templates. Responses are walked with a
//! streaming reader that matches on local element names only, since
//! servers disagree on namespace prefixes.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;

use textcal_core::TimeWindow;

/// A calendar collection discovered via PROPFIND.
#[derive(Debug, Clone)]
pub struct DiscoveredCalendar {
    /// The collection href (path or absolute URL).
    pub href: String,
    /// The display name, when the server sent one.
    pub display_name: Option<String>,
}

/// One event resource extracted from a REPORT multistatus response.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// The resource href (path to the .ics object).
    pub href: String,
    /// The etag, if the server sent one.
    pub etag: Option<String>,
    /// The raw iCalendar payload.
    pub calendar_data: String,
}

/// Body of the discovery PROPFIND. Display name and resource type are the
/// only properties the store reads.
const PROPFIND_CALENDARS: &str = "<d:propfind xmlns:d=\"DAV:\">\
     <d:prop><d:displayname/><d:resourcetype/></d:prop>\
     </d:propfind>";

/// Returns the PROPFIND request body for calendar discovery.
pub fn propfind_calendars_body() -> String {
    PROPFIND_CALENDARS.to_string()
}

/// Builds a calendar-query REPORT body covering a time window.
///
/// The server filters VEVENTs overlapping the window and expands
/// recurring events into instances.
pub fn calendar_query_body(window: &TimeWindow) -> String {
    format!(
        "<c:calendar-query xmlns:d=\"DAV:\" xmlns:c=\"urn:ietf:params:xml:ns:caldav\">\
         <d:prop><d:getetag/><c:calendar-data/></d:prop>\
         <c:filter><c:comp-filter name=\"VCALENDAR\"><c:comp-filter name=\"VEVENT\">\
         <c:time-range start=\"{}\" end=\"{}\"/>\
         </c:comp-filter></c:comp-filter></c:filter></c:calendar-query>",
        caldav_time(window.start),
        caldav_time(window.end)
    )
}

#[derive(Default)]
struct CalendarProps {
    href: Option<String>,
    display_name: Option<String>,
    is_calendar: bool,
}

enum CalendarField {
    None,
    Href,
    DisplayName,
}

/// Parses a PROPFIND multistatus response into discovered calendars.
///
/// Only responses whose resourcetype contains a `<calendar/>` element are
/// kept; plain WebDAV collections are skipped.
pub fn parse_propfind_response(xml: &str) -> Vec<DiscoveredCalendar> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut calendars = Vec::new();
    let mut current = CalendarProps::default();
    let mut field = CalendarField::None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"response" => current = CalendarProps::default(),
                b"href" => field = CalendarField::Href,
                b"displayname" => field = CalendarField::DisplayName,
                b"calendar" => current.is_calendar = true,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                match field {
                    CalendarField::Href => current.href = Some(text),
                    CalendarField::DisplayName => current.display_name = Some(text),
                    CalendarField::None => {}
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"response"
                    && current.is_calendar
                    && let Some(href) = current.href.take()
                {
                    calendars.push(DiscoveredCalendar {
                        href,
                        display_name: current.display_name.take(),
                    });
                }
                field = CalendarField::None;
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    calendars
}

#[derive(Default)]
struct EntryProps {
    href: Option<String>,
    etag: Option<String>,
    calendar_data: Option<String>,
}

enum EntryField {
    None,
    Href,
    Etag,
    CalendarData,
}

impl EntryProps {
    fn set(&mut self, field: &EntryField, text: String) {
        match field {
            EntryField::Href => self.href = Some(text),
            // Servers quote etags; the quotes are not part of the value.
            EntryField::Etag => self.etag = Some(text.trim_matches('"').to_string()),
            EntryField::CalendarData => self.calendar_data = Some(text),
            EntryField::None => {}
        }
    }
}

/// Parses a REPORT multistatus response into event resources.
///
/// Calendar data arrives either as escaped text or inside CDATA depending
/// on the server; both are handled.
pub fn parse_report_response(xml: &str) -> Vec<ReportEntry> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current = EntryProps::default();
    let mut field = EntryField::None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"response" => current = EntryProps::default(),
                b"href" => field = EntryField::Href,
                b"getetag" => field = EntryField::Etag,
                b"calendar-data" => field = EntryField::CalendarData,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                current.set(&field, text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                current.set(&field, text);
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"response"
                    && let (Some(href), Some(calendar_data)) =
                        (current.href.take(), current.calendar_data.take())
                {
                    entries.push(ReportEntry {
                        href,
                        etag: current.etag.take(),
                        calendar_data,
                    });
                }
                field = EntryField::None;
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    entries
}

/// Strips any namespace prefix from an element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Formats an instant the way time-range filters expect it (UTC basic).
fn caldav_time(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

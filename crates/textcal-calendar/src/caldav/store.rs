//! CalDAV calendar store implementation.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use textcal_core::{NormalizedEvent, TimeWindow};

use crate::error::{StoreErrorCode, StoreResult};
use crate::store::{AccessStatus, BoxFuture, CalendarInfo, CalendarStore, StoredEvent};

use super::client::CalDavClient;
use super::config::CalDavConfig;
use super::ics::{build_event_ics, parse_ics_events};
use super::xml::{
    DiscoveredCalendar, calendar_query_body, parse_propfind_response, parse_report_response,
    propfind_calendars_body,
};

/// Calendar store backed by a CalDAV server.
///
/// Calendar identifiers are absolute collection URLs; discovery resolves
/// server-relative hrefs against the configured base URL.
#[derive(Debug)]
pub struct CalDavStore {
    /// Authenticated transport shared by every request.
    client: CalDavClient,
    /// Cached discovery result, filled on first use.
    calendars: Mutex<Option<Vec<DiscoveredCalendar>>>,
}

impl CalDavStore {
    /// Creates a new CalDAV store with the given configuration.
    pub fn new(config: CalDavConfig) -> StoreResult<Self> {
        let client = CalDavClient::new(config)?;

        Ok(Self {
            client,
            calendars: Mutex::new(None),
        })
    }

    /// Discovers calendar collections at the configured URL.
    ///
    /// Servers whose base URL points directly at a calendar collection
    /// answer the PROPFIND without any calendar children; in that case the
    /// base URL itself is treated as the one calendar.
    async fn discover(&self) -> StoreResult<Vec<DiscoveredCalendar>> {
        {
            let cached = self.calendars.lock().await;
            if let Some(ref calendars) = *cached {
                return Ok(calendars.clone());
            }
        }

        let url = self.client.base().as_str().to_string();

        debug!(url = %url, "discovering calendars");

        let response = self.client.propfind(&url, propfind_calendars_body()).await?;
        let mut calendars = parse_propfind_response(&response);

        if calendars.is_empty() {
            debug!("empty propfind result, treating the base URL as one calendar");
            calendars = vec![DiscoveredCalendar {
                href: url,
                display_name: None,
            }];
        } else {
            info!(count = calendars.len(), "calendar discovery complete");
        }

        let mut cached = self.calendars.lock().await;
        *cached = Some(calendars.clone());

        Ok(calendars)
    }

    /// Resolves a calendar identifier to an absolute collection URL.
    fn resolve_calendar_url(&self, calendar_id: &str) -> String {
        resolve_href(self.client.base(), calendar_id)
    }

    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> StoreResult<Vec<StoredEvent>> {
        let url = self.resolve_calendar_url(calendar_id);

        debug!(
            calendar = %url,
            start = %window.start,
            end = %window.end,
            "querying the duplicate window"
        );

        let response = self.client.report(&url, calendar_query_body(window)).await?;
        let entries = parse_report_response(&response);

        // The server matches events overlapping the window; keep only
        // those that start inside it.
        let events: Vec<StoredEvent> = entries
            .iter()
            .flat_map(|entry| parse_ics_events(&entry.calendar_data))
            .filter(|event| window.contains_event_time(&event.start))
            .collect();

        debug!(calendar = %url, count = events.len(), "window query answered");

        Ok(events)
    }

    async fn put_event(&self, calendar_id: &str, event: &NormalizedEvent) -> StoreResult<String> {
        let url = self.resolve_calendar_url(calendar_id);
        let uid = uuid::Uuid::new_v4().to_string();
        let ics = build_event_ics(event, &uid);
        let object_url = format!("{}/{}.ics", url.trim_end_matches('/'), uid);

        debug!(title = %event.title, url = %object_url, "putting new calendar object");

        self.client.create_object(&object_url, ics).await?;

        info!(title = %event.title, uid = %uid, "event created");

        Ok(uid)
    }
}

impl CalendarStore for CalDavStore {
    fn name(&self) -> &str {
        "caldav"
    }

    fn request_access(&self) -> BoxFuture<'_, StoreResult<AccessStatus>> {
        Box::pin(async move {
            match self.discover().await {
                Ok(_) => Ok(AccessStatus::Granted),
                Err(e)
                    if matches!(
                        e.code(),
                        StoreErrorCode::AccessDenied | StoreErrorCode::AuthenticationFailed
                    ) =>
                {
                    warn!(error = %e, "access probe rejected");
                    Ok(AccessStatus::Denied)
                }
                Err(e) => Err(e),
            }
        })
    }

    fn list_calendars(&self) -> BoxFuture<'_, StoreResult<Vec<CalendarInfo>>> {
        Box::pin(async move {
            let calendars = self.discover().await?;
            let base = self.client.base();

            Ok(calendars
                .into_iter()
                .map(|c| {
                    let id = resolve_href(base, &c.href);
                    let name = c
                        .display_name
                        .unwrap_or_else(|| href_display_name(&c.href));
                    CalendarInfo::new(id, name)
                })
                .collect())
        })
    }

    fn events_between(
        &self,
        calendar_id: &str,
        window: TimeWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredEvent>>> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move { self.fetch_events(&calendar_id, &window).await })
    }

    fn insert_event(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> BoxFuture<'_, StoreResult<String>> {
        let calendar_id = calendar_id.to_string();
        let event = event.clone();
        Box::pin(async move { self.put_event(&calendar_id, &event).await })
    }
}

/// Expands an href from a multistatus response into an absolute URL.
///
/// Member hrefs arrive as server-absolute paths, collection-relative
/// names, or occasionally full URLs; RFC 3986 reference resolution
/// against the store base covers all three.
fn resolve_href(base: &url::Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Derives a readable calendar name from an href without a displayname.
fn href_display_name(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(href)
        .to_string()
}

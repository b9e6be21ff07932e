//! In-memory calendar store.
//!
//! Backs tests and dry runs. Behavior mirrors a real store closely enough
//! for the gateway: calendar listing, windowed queries and additive inserts
//! with generated identifiers. The access answer is scripted at
//! construction time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use textcal_core::{EventTime, NormalizedEvent, TimeWindow};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::store::{AccessStatus, BoxFuture, CalendarInfo, CalendarStore, StoredEvent};

/// A calendar store kept entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    calendars: Vec<CalendarInfo>,
    events: Mutex<HashMap<String, Vec<StoredEvent>>>,
    access: AccessStatus,
    access_requests: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store that grants access.
    pub fn new() -> Self {
        Self {
            calendars: Vec::new(),
            events: Mutex::new(HashMap::new()),
            access: AccessStatus::Granted,
            access_requests: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Creates a store with a single default calendar named "Calendar".
    pub fn with_default_calendar() -> Self {
        Self::new().with_calendar(CalendarInfo::new("default", "Calendar").with_default(true))
    }

    /// Registers a calendar.
    pub fn with_calendar(mut self, info: CalendarInfo) -> Self {
        self.events
            .get_mut()
            .insert(info.id.clone(), Vec::new());
        self.calendars.push(info);
        self
    }

    /// Scripts the answer `request_access` returns.
    pub fn with_access(mut self, access: AccessStatus) -> Self {
        self.access = access;
        self
    }

    /// Seeds an event so duplicate queries have something to find.
    pub fn with_event(mut self, calendar_id: &str, event: StoredEvent) -> Self {
        self.events
            .get_mut()
            .entry(calendar_id.to_string())
            .or_default()
            .push(event);
        self
    }

    /// Number of times access has been requested.
    pub fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }

    /// Returns all events in a calendar, in insertion order.
    pub async fn events_in(&self, calendar_id: &str) -> Vec<StoredEvent> {
        self.events
            .lock()
            .await
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of stored events across calendars.
    pub async fn event_count(&self) -> usize {
        self.events.lock().await.values().map(Vec::len).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn request_access(&self) -> BoxFuture<'_, StoreResult<AccessStatus>> {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        let access = self.access;
        Box::pin(async move { Ok(access) })
    }

    fn list_calendars(&self) -> BoxFuture<'_, StoreResult<Vec<CalendarInfo>>> {
        let calendars = self.calendars.clone();
        Box::pin(async move { Ok(calendars) })
    }

    fn events_between(
        &self,
        calendar_id: &str,
        window: TimeWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredEvent>>> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            let events = self.events.lock().await;
            let stored = events.get(&calendar_id).ok_or_else(|| {
                StoreError::not_found(format!("no calendar with id {}", calendar_id))
                    .with_store("memory")
            })?;
            Ok(stored
                .iter()
                .filter(|event| window.contains_event_time(&event.start))
                .cloned()
                .collect())
        })
    }

    fn insert_event(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> BoxFuture<'_, StoreResult<String>> {
        let calendar_id = calendar_id.to_string();
        let stored = StoredEvent {
            id: format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            title: event.title.clone(),
            start: event.start,
            end: Some(event.end),
        };
        Box::pin(async move {
            let mut events = self.events.lock().await;
            let slot = events.get_mut(&calendar_id).ok_or_else(|| {
                StoreError::not_found(format!("no calendar with id {}", calendar_id))
                    .with_store("memory")
            })?;
            let id = stored.id.clone();
            slot.push(stored);
            Ok(id)
        })
    }
}

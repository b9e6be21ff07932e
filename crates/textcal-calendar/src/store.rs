//! CalendarStore trait definition.
//!
//! This module defines the [`CalendarStore`] trait, the abstraction over
//! writable calendar backends (CalDAV, in-memory). Stores are responsible
//! for:
//! - Negotiating access to calendar data
//! - Listing calendars
//! - Querying stored events inside a time window
//! - Inserting new events
//!
//! Stores never update or delete; the commit path is strictly additive.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use textcal_core::{EventTime, NormalizedEvent, TimeWindow};

use crate::error::StoreResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe, so the store behind the
/// gateway can be chosen by configuration at startup.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The outcome of an access negotiation.
///
/// Denial is a value, not an error: callers branch on it to produce a
/// distinguishable access-denied failure instead of a generic store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// Calendar data may be read and written.
    Granted,
    /// The user or server refused access.
    Denied,
}

impl AccessStatus {
    /// Returns true if access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Information about a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    /// Unique identifier for the calendar.
    pub id: String,
    /// Human-readable name of the calendar.
    pub name: String,
    /// Whether events can be added to this calendar.
    pub read_only: bool,
    /// Whether this is the store's default calendar.
    pub is_default: bool,
    /// Display color, if the store reports one.
    pub color: Option<String>,
}

impl CalendarInfo {
    /// Creates a new CalendarInfo with the given ID and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            read_only: false,
            is_default: false,
            color: None,
        }
    }

    /// Marks this as the default calendar.
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Marks the calendar read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// An event as it exists in a store, reduced to what duplicate detection
/// and reporting need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Store-assigned identifier.
    pub id: String,
    /// Event title.
    pub title: String,
    /// Start of the event.
    pub start: EventTime,
    /// End of the event, if the store reports one.
    pub end: Option<EventTime>,
}

impl StoredEvent {
    /// Creates a new stored event.
    pub fn new(id: impl Into<String>, title: impl Into<String>, start: EventTime) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end: None,
        }
    }

    /// Sets the end time.
    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }
}

/// The core abstraction for writable calendar backends.
///
/// # Implementation Notes
///
/// - Implementations should be `Send + Sync` for use in async contexts
/// - `request_access` may be called repeatedly; implementations need not
///   cache the answer, the gateway does
/// - Borrowed arguments must be cloned before entering the async block so
///   the returned future only borrows `self`
pub trait CalendarStore: Send + Sync + fmt::Debug {
    /// Returns the name/type of this store (e.g., "caldav", "memory").
    fn name(&self) -> &str;

    /// Negotiates access to calendar data.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when negotiation itself fails; a clean refusal
    /// is `Ok(AccessStatus::Denied)`.
    fn request_access(&self) -> BoxFuture<'_, StoreResult<AccessStatus>>;

    /// Lists available calendars.
    fn list_calendars(&self) -> BoxFuture<'_, StoreResult<Vec<CalendarInfo>>>;

    /// Returns events in the calendar whose start lies inside the window.
    fn events_between(
        &self,
        calendar_id: &str,
        window: TimeWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredEvent>>>;

    /// Inserts a new event and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on network failures, unknown calendars or
    /// server rejection. Insertion never overwrites an existing event.
    fn insert_event(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> BoxFuture<'_, StoreResult<String>>;
}

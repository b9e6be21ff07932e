//! Commit gateway over a calendar store.
//!
//! The gateway owns the policy around a [`CalendarStore`]:
//! - access is negotiated once and the answer cached for the gateway's
//!   lifetime, with denial surfaced as a distinguishable error
//! - the target calendar is resolved by name with fallback to the store's
//!   default, never to a read-only calendar
//! - duplicate detection compares trimmed, case-folded titles of events
//!   whose start lies within the configured tolerance of the candidate
//! - commits are strictly additive, one outcome per event, and only access
//!   denial escapes as an error

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use textcal_core::{CommitOutcome, NormalizedEvent, SkipReason, TimeWindow};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{AccessStatus, CalendarInfo, CalendarStore};

/// Gateway policy knobs.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Calendar name events go to; `None` selects the store default.
    pub target_calendar: Option<String>,
    /// Two events with the same title whose starts differ by no more than
    /// this are considered the same event.
    pub duplicate_tolerance: Duration,
    /// How long to wait for an access answer.
    pub access_timeout: StdDuration,
    /// When set, everything runs except the final insert.
    pub dry_run: bool,
}

impl GatewayConfig {
    /// Default duplicate tolerance in seconds.
    pub const DEFAULT_DUPLICATE_TOLERANCE_SECS: i64 = 60;

    /// Default access negotiation timeout in seconds.
    pub const DEFAULT_ACCESS_TIMEOUT_SECS: u64 = 10;

    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            target_calendar: None,
            duplicate_tolerance: Duration::seconds(Self::DEFAULT_DUPLICATE_TOLERANCE_SECS),
            access_timeout: StdDuration::from_secs(Self::DEFAULT_ACCESS_TIMEOUT_SECS),
            dry_run: false,
        }
    }

    /// Names the calendar commits should target.
    pub fn with_target_calendar(mut self, name: impl Into<String>) -> Self {
        self.target_calendar = Some(name.into());
        self
    }

    /// Sets how close two starts must be to count as the same event.
    pub fn with_duplicate_tolerance(mut self, tolerance: Duration) -> Self {
        self.duplicate_tolerance = tolerance;
        self
    }

    /// Bounds how long to wait for the access decision.
    pub fn with_access_timeout(mut self, timeout: StdDuration) -> Self {
        self.access_timeout = timeout;
        self
    }

    /// Runs the duplicate check but stops short of inserting.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Duplicate comparison key for a title.
fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Policy layer between the pipeline and a calendar store.
pub struct CalendarGateway {
    store: Arc<dyn CalendarStore>,
    config: GatewayConfig,
    access: Mutex<Option<AccessStatus>>,
    calendars: Mutex<Option<Vec<CalendarInfo>>>,
}

impl CalendarGateway {
    /// Creates a gateway over the given store.
    pub fn new(store: Arc<dyn CalendarStore>, config: GatewayConfig) -> Self {
        Self {
            store,
            config,
            access: Mutex::new(None),
            calendars: Mutex::new(None),
        }
    }

    /// Returns the name of the underlying store.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Negotiates access, caching clean answers.
    ///
    /// A granted or denied answer is cached for the gateway's lifetime.
    /// Negotiation failures (store errors, no answer within the timeout)
    /// are not cached, so a later call may still succeed.
    ///
    /// # Errors
    ///
    /// Returns an access-denied error when the answer is a denial, and the
    /// underlying store error when negotiation itself fails.
    pub async fn ensure_access(&self) -> StoreResult<()> {
        let mut cached = self.access.lock().await;
        let status = match *cached {
            Some(status) => status,
            None => {
                let status =
                    tokio::time::timeout(self.config.access_timeout, self.store.request_access())
                        .await
                        .map_err(|_| {
                            StoreError::network(format!(
                                "no access answer within {:?}",
                                self.config.access_timeout
                            ))
                            .with_store(self.store.name())
                        })??;
                debug!(store = %self.store.name(), granted = status.is_granted(), "access negotiated");
                *cached = Some(status);
                status
            }
        };

        if status.is_granted() {
            Ok(())
        } else {
            Err(StoreError::access_denied("calendar access was denied").with_store(self.store.name()))
        }
    }

    /// Lists the store's calendars.
    ///
    /// The list is fetched once and cached for the gateway's lifetime.
    pub async fn list_calendars(&self) -> StoreResult<Vec<CalendarInfo>> {
        self.ensure_access().await?;
        self.calendars().await
    }

    async fn calendars(&self) -> StoreResult<Vec<CalendarInfo>> {
        let mut cached = self.calendars.lock().await;
        if let Some(ref calendars) = *cached {
            return Ok(calendars.clone());
        }
        let calendars = self.store.list_calendars().await?;
        *cached = Some(calendars.clone());
        Ok(calendars)
    }

    /// Picks the calendar an event goes to.
    ///
    /// Per-event names win over the configured target. A name that matches
    /// nothing, or matches a read-only calendar, falls back to the store's
    /// default with a warning. Matching ignores case and surrounding
    /// whitespace.
    async fn resolve_target(&self, requested: Option<&str>) -> StoreResult<CalendarInfo> {
        let calendars = self.calendars().await?;
        if calendars.is_empty() {
            return Err(StoreError::not_found("store has no calendars").with_store(self.store.name()));
        }

        let requested = requested.or(self.config.target_calendar.as_deref());
        if let Some(name) = requested {
            let needle = title_key(name);
            match calendars.iter().find(|c| title_key(&c.name) == needle) {
                Some(found) if !found.read_only => return Ok(found.clone()),
                Some(found) => {
                    warn!(calendar = %found.name, "requested calendar is read-only, using default");
                }
                None => {
                    warn!(calendar = %name, "no calendar with this name, using default");
                }
            }
        }

        if let Some(found) = calendars.iter().find(|c| c.is_default && !c.read_only) {
            return Ok(found.clone());
        }
        if let Some(found) = calendars.iter().find(|c| !c.read_only) {
            return Ok(found.clone());
        }
        Err(StoreError::not_found("no writable calendar available").with_store(self.store.name()))
    }

    /// Looks for an existing event the candidate would duplicate.
    async fn find_duplicate(
        &self,
        calendar_id: &str,
        event: &NormalizedEvent,
    ) -> StoreResult<Option<String>> {
        let center = event.start.instant();
        let window = TimeWindow::around(center, self.config.duplicate_tolerance);
        let existing = self.store.events_between(calendar_id, window).await?;

        let needle = title_key(&event.title);
        Ok(existing
            .into_iter()
            .find(|stored| title_key(&stored.title) == needle)
            .map(|stored| stored.id))
    }

    /// Commits one event.
    ///
    /// The outcome is per-event: duplicates come back as skips and store
    /// failures come back as failed outcomes, so one bad event never stops
    /// the rest of a run.
    ///
    /// # Errors
    ///
    /// Only access problems escape as errors; check
    /// [`StoreError::is_access_denied`] to tell denial from negotiation
    /// failure.
    pub async fn commit(&self, event: &NormalizedEvent) -> StoreResult<CommitOutcome> {
        self.ensure_access().await?;

        let calendar = match self.resolve_target(event.calendar_name.as_deref()).await {
            Ok(calendar) => calendar,
            Err(e) if e.is_access_denied() => return Err(e),
            Err(e) => return Ok(CommitOutcome::failed(e.to_string())),
        };

        match self.find_duplicate(&calendar.id, event).await {
            Ok(Some(existing_id)) => {
                debug!(
                    title = %event.title,
                    existing = %existing_id,
                    calendar = %calendar.name,
                    "skipping duplicate event"
                );
                return Ok(CommitOutcome::skipped(SkipReason::Duplicate));
            }
            Ok(None) => {}
            Err(e) if e.is_access_denied() => return Err(e),
            Err(e) => return Ok(CommitOutcome::failed(e.to_string())),
        }

        if self.config.dry_run {
            info!(title = %event.title, calendar = %calendar.name, "dry run, not inserting");
            return Ok(CommitOutcome::added("dry-run"));
        }

        match self.store.insert_event(&calendar.id, event).await {
            Ok(id) => {
                info!(title = %event.title, id = %id, calendar = %calendar.name, "event added");
                Ok(CommitOutcome::added(id))
            }
            Err(e) if e.is_access_denied() => Err(e),
            Err(e) => {
                warn!(title = %event.title, error = %e, "insert failed");
                Ok(CommitOutcome::failed(e.to_string()))
            }
        }
    }
}

//! CalDAV calendar store.
//!
//! [`CalDavStore`] implements the store trait against any CalDAV server:
//! PROPFIND discovers the calendar collections, REPORT answers the
//! duplicate window query, and commits are creation-only PUTs
//! (`If-None-Match: *`) so an existing object is never overwritten.
//! Authentication is preemptive HTTP Basic.
//!
//! # Example
//!
//! ```ignore
//! use textcal_calendar::caldav::{CalDavConfig, CalDavStore};
//!
//! let config = CalDavConfig::new("https://dav.example.com/calendars/alice/")?
//!     .with_credentials("alice", "secret");
//!
//! let store = CalDavStore::new(config)?;
//! let calendars = store.list_calendars().await?;
//! ```

mod auth;
mod client;
mod config;
mod ics;
mod store;
mod xml;

pub use config::CalDavConfig;
pub use store::CalDavStore;

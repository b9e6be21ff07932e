//! CalendarStore trait, implementations and the commit gateway.
//!
//! This crate provides the calendar side of the extraction pipeline:
//!
//! - [`CalendarStore`] - The write-side trait each backend implements
//! - [`CalendarGateway`] - Access caching, target resolution and
//!   duplicate-aware commits on top of any store
//! - [`MemoryStore`] - In-process store for tests and dry runs
//! - [`StoreError`] - Store failures, with access denial kept distinguishable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  CalDAV Server  │    │   In-memory     │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │   CalDavStore   │    │   MemoryStore   │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          │    CalendarStore     │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │ CalendarGateway │  access cache, duplicate window,
//!            └────────┬────────┘  additive commits
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │  CommitOutcome  │
//!            └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use textcal_calendar::{CalendarGateway, GatewayConfig, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::with_default_calendar());
//! let gateway = CalendarGateway::new(store, GatewayConfig::new());
//! let outcome = gateway.commit(&event).await?;
//! ```

#[cfg(feature = "caldav")]
pub mod caldav;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use gateway::{CalendarGateway, GatewayConfig};
pub use memory::MemoryStore;
pub use store::{AccessStatus, BoxFuture, CalendarInfo, CalendarStore, StoredEvent};

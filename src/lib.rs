//! Mortis - Mortuary Operations Service
//!
//! TigerStyle: Record keeping for deceased individuals, storage-unit
//! occupancy tracking, funeral scheduling, and operator notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               HTTP API (axum)                │
//! ├──────────┬──────────┬──────────┬────────────┤
//! │ storage  │ records  │ schedule │ notify     │
//! │ registry │ keeping  │          │ feed       │
//! ├──────────┴──────────┴──────────┴────────────┤
//! │ wire: snake_case DTOs, date truncation      │
//! ├─────────────────────────────────────────────┤
//! │ client: typed API client + cached Registry  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The registry holds the unit set behind a shared store; assignments bind
//! deceased records to available units, release reverses, and the
//! maintenance toggle takes units in and out of service. The client-side
//! `Registry` mirrors the server set, reconciling by id and mutating only
//! on confirmation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod filter;
pub mod http;
pub mod notify;
pub mod records;
pub mod schedule;
pub mod storage;
pub mod wire;

// Re-export common types
pub use client::{ApiClient, ClientError, Registry};
pub use filter::{filter_units, UnitFilter};
pub use http::{router, AppState};
pub use notify::{Notification, NotificationKind, NotificationStore, Priority};
pub use records::{DeceasedRecord, RecordStatus, RecordStore};
pub use schedule::{FuneralEvent, ScheduleStore, ServiceType};
pub use storage::{
    Capacity, Occupant, OccupancySummary, StorageStore, StorageUnit, UnitStatus,
};

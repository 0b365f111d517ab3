//! Funeral Scheduling
//!
//! Scheduled services for deceased individuals: burial, cremation, memorial,
//! viewing, graveside. Events are operator-entered and free-standing; a
//! service does not have to reference a record in storage.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Maximum deceased name length in bytes
pub const DECEASED_NAME_BYTES_MAX: usize = 150;

/// Maximum location length in bytes
pub const LOCATION_BYTES_MAX: usize = 255;

/// Maximum number of scheduled events held in memory
pub const EVENTS_COUNT_MAX: usize = 1_000;

/// Event ID prefix for readability
pub const EVENT_ID_PREFIX: &str = "evt_";

/// Dashboard window for upcoming services, in days
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

// =============================================================================
// Types
// =============================================================================

/// Kind of funeral service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Burial service
    Burial,
    /// Cremation service
    Cremation,
    /// Memorial service
    Memorial,
    /// Viewing/wake
    Viewing,
    /// Graveside service
    Graveside,
}

impl ServiceType {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Burial => "burial",
            Self::Cremation => "cremation",
            Self::Memorial => "memorial",
            Self::Viewing => "viewing",
            Self::Graveside => "graveside",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "burial" => Some(Self::Burial),
            "cremation" => Some(Self::Cremation),
            "memorial" => Some(Self::Memorial),
            "viewing" => Some(Self::Viewing),
            "graveside" => Some(Self::Graveside),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled funeral service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuneralEvent {
    /// Unique event ID
    pub id: String,
    /// Name of the deceased the service is for
    pub deceased_name: String,
    /// Kind of service
    pub service_type: ServiceType,
    /// Service date
    pub date: NaiveDate,
    /// Service start time
    pub time: NaiveTime,
    /// Venue
    pub location: String,
    /// Officiant, if arranged
    pub officiant: Option<String>,
    /// Expected attendee count, if estimated
    pub expected_attendees: Option<u32>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl FuneralEvent {
    /// Create a new event.
    ///
    /// # Panics
    /// Panics if name or location exceed limits.
    #[must_use]
    pub fn new(
        deceased_name: String,
        service_type: ServiceType,
        date: NaiveDate,
        time: NaiveTime,
        location: String,
    ) -> Self {
        assert!(
            deceased_name.len() <= DECEASED_NAME_BYTES_MAX,
            "deceased name {} bytes exceeds max {}",
            deceased_name.len(),
            DECEASED_NAME_BYTES_MAX
        );
        assert!(
            location.len() <= LOCATION_BYTES_MAX,
            "location {} bytes exceeds max {}",
            location.len(),
            LOCATION_BYTES_MAX
        );

        Self {
            id: format!("{}{}", EVENT_ID_PREFIX, &Uuid::new_v4().to_string()[..8]),
            deceased_name,
            service_type,
            date,
            time,
            location,
            officiant: None,
            expected_attendees: None,
            notes: None,
        }
    }

    /// Two events conflict when they share a venue, date, and start time.
    #[must_use]
    pub fn conflicts_with(&self, other: &FuneralEvent) -> bool {
        self.id != other.id
            && self.location == other.location
            && self.date == other.date
            && self.time == other.time
    }
}

// =============================================================================
// Schedule Store
// =============================================================================

/// In-memory funeral schedule.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    /// Events by ID
    events: HashMap<String, FuneralEvent>,
}

impl ScheduleStore {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event.
    pub fn schedule(&mut self, event: FuneralEvent) -> Result<(), ScheduleError> {
        if self.events.len() >= EVENTS_COUNT_MAX {
            return Err(ScheduleError::ScheduleFull {
                count: self.events.len(),
                max: EVENTS_COUNT_MAX,
            });
        }
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    /// Get an event by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FuneralEvent> {
        self.events.get(id)
    }

    /// Replace an event's details, keeping its ID.
    pub fn update(&mut self, id: &str, mut event: FuneralEvent) -> Result<FuneralEvent, ScheduleError> {
        if !self.events.contains_key(id) {
            return Err(ScheduleError::NotFound(id.to_string()));
        }
        event.id = id.to_string();
        self.events.insert(id.to_string(), event.clone());
        Ok(event)
    }

    /// Cancel an event.
    pub fn cancel(&mut self, id: &str) -> Result<FuneralEvent, ScheduleError> {
        self.events
            .remove(id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))
    }

    /// All events in chronological order.
    #[must_use]
    pub fn list(&self) -> Vec<&FuneralEvent> {
        let mut events: Vec<&FuneralEvent> = self.events.values().collect();
        events.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        events
    }

    /// Events falling within `days` of `today`, inclusive, chronological.
    #[must_use]
    pub fn upcoming(&self, today: NaiveDate, days: i64) -> Vec<&FuneralEvent> {
        self.list()
            .into_iter()
            .filter(|e| {
                let delta = (e.date - today).num_days();
                (0..=days).contains(&delta)
            })
            .collect()
    }

    /// Existing events that clash with the given one.
    #[must_use]
    pub fn conflicts(&self, event: &FuneralEvent) -> Vec<&FuneralEvent> {
        self.list()
            .into_iter()
            .filter(|e| e.conflicts_with(event))
            .collect()
    }
}

/// Thread-safe schedule store
pub type SharedScheduleStore = Arc<RwLock<ScheduleStore>>;

/// Create a new shared schedule store
#[must_use]
pub fn new_shared_store() -> SharedScheduleStore {
    Arc::new(RwLock::new(ScheduleStore::new()))
}

// =============================================================================
// Errors
// =============================================================================

/// Scheduling errors
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule is full: {count} >= {max}")]
    ScheduleFull { count: usize, max: usize },

    #[error("scheduled event not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, date: (i32, u32, u32), time: (u32, u32), location: &str) -> FuneralEvent {
        FuneralEvent::new(
            name.to_string(),
            ServiceType::Burial,
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            location.to_string(),
        )
    }

    #[test]
    fn test_list_is_chronological() {
        let mut store = ScheduleStore::new();
        store.schedule(event("Mary Johnson", (2025, 1, 20), (14, 0), "Chapel B")).unwrap();
        store.schedule(event("John Smith", (2025, 1, 18), (10, 0), "Chapel A")).unwrap();
        store.schedule(event("Robert Williams", (2025, 1, 18), (9, 0), "Chapel A")).unwrap();

        let names: Vec<&str> = store.list().iter().map(|e| e.deceased_name.as_str()).collect();
        assert_eq!(names, vec!["Robert Williams", "John Smith", "Mary Johnson"]);
    }

    #[test]
    fn test_upcoming_window() {
        let mut store = ScheduleStore::new();
        store.schedule(event("Past", (2025, 1, 10), (10, 0), "Chapel A")).unwrap();
        store.schedule(event("Today", (2025, 1, 15), (10, 0), "Chapel A")).unwrap();
        store.schedule(event("In Window", (2025, 1, 21), (10, 0), "Chapel B")).unwrap();
        store.schedule(event("Beyond", (2025, 1, 30), (10, 0), "Chapel B")).unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let names: Vec<&str> = store
            .upcoming(today, UPCOMING_WINDOW_DAYS)
            .iter()
            .map(|e| e.deceased_name.as_str())
            .collect();
        assert_eq!(names, vec!["Today", "In Window"]);
    }

    #[test]
    fn test_conflict_detection() {
        let mut store = ScheduleStore::new();
        let existing = event("John Smith", (2025, 1, 18), (10, 0), "Chapel A");
        store.schedule(existing).unwrap();

        let clashing = event("Mary Johnson", (2025, 1, 18), (10, 0), "Chapel A");
        assert_eq!(store.conflicts(&clashing).len(), 1);

        let other_time = event("Mary Johnson", (2025, 1, 18), (11, 0), "Chapel A");
        assert!(store.conflicts(&other_time).is_empty());

        let other_venue = event("Mary Johnson", (2025, 1, 18), (10, 0), "Chapel B");
        assert!(store.conflicts(&other_venue).is_empty());
    }

    #[test]
    fn test_update_keeps_id() {
        let mut store = ScheduleStore::new();
        let original = event("John Smith", (2025, 1, 18), (10, 0), "Chapel A");
        let id = original.id.clone();
        store.schedule(original).unwrap();

        let replacement = event("John Smith", (2025, 1, 19), (11, 0), "Chapel B");
        let updated = store.update(&id, replacement).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(store.get(&id).unwrap().location, "Chapel B");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_cancel_unknown_event() {
        let mut store = ScheduleStore::new();
        assert!(matches!(store.cancel("evt_missing"), Err(ScheduleError::NotFound(_))));
    }
}

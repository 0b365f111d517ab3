//! Operator Notifications
//!
//! A bounded, in-memory notification feed plus the alert producers that
//! derive notifications from registry and schedule state. Producers are
//! plain functions called at mutation time; there are no background
//! sweepers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::schedule::FuneralEvent;
use crate::storage::{StorageUnit, UnitStatus, CAPACITY_ALERT_THRESHOLD_PCT};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Maximum notifications retained; oldest are dropped past this
pub const NOTIFICATIONS_COUNT_MAX: usize = 500;

/// Notification ID prefix for readability
pub const NOTIFICATION_ID_PREFIX: &str = "ntf_";

/// Days of warning before a storage deadline counts as approaching
pub const DEADLINE_WARNING_DAYS: i64 = 1;

// =============================================================================
// Types
// =============================================================================

/// Category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Unit servicing events
    Maintenance,
    /// Paperwork requiring attention
    Documentation,
    /// Storage occupancy and deadline alerts
    Storage,
    /// Scheduling clashes and changes
    Schedule,
}

/// Urgency of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational
    Low,
    /// Needs attention soon
    Medium,
    /// Needs attention now
    High,
}

/// A single feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification ID
    pub id: String,
    /// Category
    pub kind: NotificationKind,
    /// Urgency
    pub priority: Priority,
    /// Short headline
    pub title: String,
    /// Human-readable detail
    pub description: String,
    /// When the notification was raised
    pub created_at: DateTime<Utc>,
    /// Whether the operator has seen it
    pub read: bool,
}

impl Notification {
    /// Create an unread notification.
    #[must_use]
    pub fn new(kind: NotificationKind, priority: Priority, title: String, description: String) -> Self {
        Self {
            id: format!("{}{}", NOTIFICATION_ID_PREFIX, &Uuid::new_v4().to_string()[..8]),
            kind,
            priority,
            title,
            description,
            created_at: Utc::now(),
            read: false,
        }
    }
}

// =============================================================================
// Notification Store
// =============================================================================

/// Bounded in-memory notification feed, oldest first internally.
#[derive(Debug, Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
}

impl NotificationStore {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification, dropping the oldest entry at the cap.
    pub fn push(&mut self, notification: Notification) {
        if self.notifications.len() >= NOTIFICATIONS_COUNT_MAX {
            self.notifications.remove(0);
        }
        self.notifications.push(notification);
    }

    /// All notifications, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<&Notification> {
        self.notifications.iter().rev().collect()
    }

    /// Unread notifications, newest first.
    #[must_use]
    pub fn unread(&self) -> Vec<&Notification> {
        self.notifications.iter().rev().filter(|n| !n.read).collect()
    }

    /// Count of unread notifications.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Mark one notification as read.
    pub fn mark_read(&mut self, id: &str) -> Result<(), NotifyError> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| NotifyError::NotFound(id.to_string()))?;
        notification.read = true;
        Ok(())
    }

    /// Mark every notification as read, returning how many changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in &mut self.notifications {
            if !notification.read {
                notification.read = true;
                changed += 1;
            }
        }
        changed
    }

    /// Remove one notification from the feed.
    pub fn dismiss(&mut self, id: &str) -> Result<Notification, NotifyError> {
        let index = self
            .notifications
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| NotifyError::NotFound(id.to_string()))?;
        Ok(self.notifications.remove(index))
    }

    /// Clear the whole feed, returning how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let count = self.notifications.len();
        self.notifications.clear();
        count
    }

    /// Clear unread entries only, keeping read ones.
    pub fn clear_unread(&mut self) -> usize {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.read);
        before - self.notifications.len()
    }
}

/// Thread-safe notification feed
pub type SharedNotificationStore = Arc<RwLock<NotificationStore>>;

/// Create a new shared notification feed
#[must_use]
pub fn new_shared_store() -> SharedNotificationStore {
    Arc::new(RwLock::new(NotificationStore::new()))
}

// =============================================================================
// Alert Producers
// =============================================================================

/// Deadline alerts over the current unit set.
///
/// Occupied units past their storage deadline raise a high-priority alert;
/// units within [`DEADLINE_WARNING_DAYS`] of it raise a medium one. Units
/// without a deadline are skipped.
#[must_use]
pub fn deadline_alerts(units: &[StorageUnit], today: NaiveDate) -> Vec<Notification> {
    let mut alerts = Vec::new();
    for unit in units {
        let Some(occupant) = &unit.occupant else { continue };
        let Some(deadline) = occupant.storage_deadline else { continue };

        let days_left = (deadline - today).num_days();
        if days_left < 0 {
            alerts.push(Notification::new(
                NotificationKind::Storage,
                Priority::High,
                "Storage Deadline Passed".to_string(),
                format!(
                    "Unit {} holds {} past the {} deadline",
                    unit.unit_number, occupant.name, deadline
                ),
            ));
        } else if days_left <= DEADLINE_WARNING_DAYS {
            alerts.push(Notification::new(
                NotificationKind::Storage,
                Priority::Medium,
                "Storage Deadline Approaching".to_string(),
                format!(
                    "Unit {} must release {} by {}",
                    unit.unit_number, occupant.name, deadline
                ),
            ));
        }
    }
    alerts
}

/// Capacity alert when utilization reaches the threshold.
#[must_use]
pub fn capacity_alert(units: &[StorageUnit]) -> Option<Notification> {
    if units.is_empty() {
        return None;
    }
    let occupied = units
        .iter()
        .filter(|u| matches!(u.status, UnitStatus::Occupied))
        .count();
    let pct = (occupied as f64 / units.len() as f64 * 100.0).round() as u32;
    if pct < CAPACITY_ALERT_THRESHOLD_PCT {
        return None;
    }
    Some(Notification::new(
        NotificationKind::Storage,
        Priority::Low,
        "Storage Capacity Alert".to_string(),
        format!("Storage capacity at {pct}% - consider expansion planning"),
    ))
}

/// Notice raised when a unit enters or leaves maintenance.
#[must_use]
pub fn maintenance_notice(unit: &StorageUnit, entered: bool) -> Notification {
    if entered {
        Notification::new(
            NotificationKind::Maintenance,
            Priority::Medium,
            "Storage Unit Maintenance".to_string(),
            format!("Unit {} has been taken out of service for maintenance", unit.unit_number),
        )
    } else {
        Notification::new(
            NotificationKind::Maintenance,
            Priority::Low,
            "Maintenance Complete".to_string(),
            format!("Unit {} has passed servicing and is available again", unit.unit_number),
        )
    }
}

/// Notice raised when a newly scheduled service clashes with existing ones.
#[must_use]
pub fn schedule_conflict_notice(event: &FuneralEvent) -> Notification {
    Notification::new(
        NotificationKind::Schedule,
        Priority::Medium,
        "Schedule Conflict".to_string(),
        format!(
            "{} already has a service at {} on {}",
            event.location, event.time, event.date
        ),
    )
}

// =============================================================================
// Errors
// =============================================================================

/// Notification feed errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Capacity, Occupant, StorageStore, StorageUnit};

    fn notification(title: &str) -> Notification {
        Notification::new(
            NotificationKind::Documentation,
            Priority::Medium,
            title.to_string(),
            "2 death certificates require completion and review".to_string(),
        )
    }

    fn occupied_until(number: &str, deadline: Option<(i32, u32, u32)>) -> StorageUnit {
        let mut unit =
            StorageUnit::new(number.to_string(), "Wing A".to_string(), 1, 4.0, Capacity::Single);
        unit.status = UnitStatus::Occupied;
        unit.occupant = Some(Occupant {
            record_id: "REC001".to_string(),
            name: "John Smith".to_string(),
            date_admitted: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            storage_deadline: deadline.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
        });
        unit
    }

    #[test]
    fn test_read_and_unread_bookkeeping() {
        let mut store = NotificationStore::new();
        let a = notification("Pending Documentation");
        let a_id = a.id.clone();
        store.push(a);
        store.push(notification("Urgent: Missing Documentation"));

        assert_eq!(store.unread_count(), 2);
        store.mark_read(&a_id).unwrap();
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.unread().len(), 1);

        assert_eq!(store.mark_all_read(), 1);
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_list_newest_first() {
        let mut store = NotificationStore::new();
        store.push(notification("first"));
        store.push(notification("second"));
        let titles: Vec<&str> = store.list().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn test_dismiss_and_clear_unread() {
        let mut store = NotificationStore::new();
        let a = notification("keep");
        let a_id = a.id.clone();
        store.push(a);
        store.push(notification("drop"));
        store.push(notification("drop too"));

        store.mark_read(&a_id).unwrap();
        assert_eq!(store.clear_unread(), 2);
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].title, "keep");

        let removed = store.dismiss(&a_id).unwrap();
        assert_eq!(removed.title, "keep");
        assert_eq!(store.clear_all(), 0);
    }

    #[test]
    fn test_feed_is_bounded() {
        let mut store = NotificationStore::new();
        for i in 0..NOTIFICATIONS_COUNT_MAX + 10 {
            store.push(notification(&format!("n{i}")));
        }
        assert_eq!(store.list().len(), NOTIFICATIONS_COUNT_MAX);
        // newest survive
        assert_eq!(store.list()[0].title, format!("n{}", NOTIFICATIONS_COUNT_MAX + 9));
    }

    #[test]
    fn test_deadline_alerts() {
        let units = vec![
            occupied_until("A-01", Some((2025, 1, 10))), // passed
            occupied_until("A-02", Some((2025, 1, 16))), // approaching
            occupied_until("A-03", Some((2025, 2, 1))),  // fine
            occupied_until("A-04", None),                // no deadline
        ];
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let alerts = deadline_alerts(&units, today);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].priority, Priority::High);
        assert!(alerts[0].description.contains("A-01"));
        assert_eq!(alerts[1].priority, Priority::Medium);
        assert!(alerts[1].description.contains("A-02"));
    }

    #[test]
    fn test_capacity_alert_threshold() {
        let mut store = StorageStore::new();
        let mut ids = Vec::new();
        for i in 0..10 {
            let unit = StorageUnit::new(
                format!("A-{i:02}"),
                "Wing A".to_string(),
                1,
                4.0,
                Capacity::Single,
            );
            ids.push(unit.id.clone());
            store.insert(unit).unwrap();
        }
        for id in ids.iter().take(8) {
            store
                .assign(id, "REC001".to_string(), "John Smith".to_string(), None)
                .unwrap();
        }
        let units: Vec<StorageUnit> = store.list().into_iter().cloned().collect();
        assert!(capacity_alert(&units).is_none(), "80% is below threshold");

        store
            .assign(&ids[8], "REC002".to_string(), "Mary Johnson".to_string(), None)
            .unwrap();
        let units: Vec<StorageUnit> = store.list().into_iter().cloned().collect();
        let alert = capacity_alert(&units).expect("90% crosses threshold");
        assert!(alert.description.contains("90%"));
    }
}

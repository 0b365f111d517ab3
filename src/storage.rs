//! Storage Unit Registry
//!
//! TigerStyle: The registry is the source of truth for physical storage
//! units and their occupancy lifecycle.
//!
//! A unit is provisioned `available`, transitions to `occupied` via assign,
//! back to `available` via release, and in/out of `maintenance` via the
//! maintenance toggle. Exactly one status holds at any time:
//!
//! ```text
//!             assign                    set_maintenance(true)
//! available ----------> occupied    available <------------> maintenance
//! available <---------- occupied         set_maintenance(false)
//!             release
//! ```
//!
//! Invariants:
//! - occupant is present iff status is `occupied`
//! - unit ids are never reused
//! - unit numbers are unique across the registry

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Maximum unit number length in bytes
pub const UNIT_NUMBER_BYTES_MAX: usize = 50;

/// Maximum wing name length in bytes
pub const WING_BYTES_MAX: usize = 50;

/// Maximum occupant display name length in bytes
pub const OCCUPANT_NAME_BYTES_MAX: usize = 150;

/// Maximum number of units in the registry
pub const UNITS_COUNT_MAX: usize = 1_000;

/// Unit ID prefix for readability
pub const UNIT_ID_PREFIX: &str = "unit_";

/// Utilization percentage at which the facility counts as near capacity
pub const CAPACITY_ALERT_THRESHOLD_PCT: u32 = 85;

// =============================================================================
// Types
// =============================================================================

/// Occupancy status of a storage unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Empty and assignable
    Available,
    /// Holding a body
    Occupied,
    /// Out of service pending physical servicing
    Maintenance,
}

impl UnitStatus {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(Self::Available),
            "occupied" => Some(Self::Occupied),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical capacity of a unit, fixed at provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capacity {
    /// One body
    Single,
    /// Two bodies
    Double,
}

impl Capacity {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The deceased-record binding held by an occupied unit.
///
/// `record_id` is a foreign reference; `name` is a display snapshot copied
/// at assignment time and never re-synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// Reference to the deceased record (not owned by the registry)
    pub record_id: String,
    /// Denormalized display name
    pub name: String,
    /// Date the body was admitted to this unit
    pub date_admitted: NaiveDate,
    /// Operator-set date by which the body must be released
    pub storage_deadline: Option<NaiveDate>,
}

/// A physical storage slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUnit {
    /// Unique unit ID, never reused
    pub id: String,
    /// Human-readable label, unique within the registry, immutable
    pub unit_number: String,
    /// Wing placement, immutable
    pub wing: String,
    /// Floor placement, immutable
    pub floor: i32,
    /// Current occupancy status
    pub status: UnitStatus,
    /// Temperature reading in Celsius, informational only
    pub temperature: f64,
    /// Physical capacity, fixed at provisioning
    pub capacity: Capacity,
    /// Present iff status is `occupied`
    pub occupant: Option<Occupant>,
    /// Date of most recent servicing, informational
    pub last_maintenance: Option<NaiveDate>,
    /// When the unit was provisioned
    pub created_at: DateTime<Utc>,
    /// When the unit last changed
    pub updated_at: DateTime<Utc>,
}

impl StorageUnit {
    /// Provision a new unit in `available` state with no occupant.
    ///
    /// # Panics
    /// Panics if unit number or wing exceed limits.
    #[must_use]
    pub fn new(unit_number: String, wing: String, floor: i32, temperature: f64, capacity: Capacity) -> Self {
        assert!(
            unit_number.len() <= UNIT_NUMBER_BYTES_MAX,
            "unit number {} bytes exceeds max {}",
            unit_number.len(),
            UNIT_NUMBER_BYTES_MAX
        );
        assert!(
            wing.len() <= WING_BYTES_MAX,
            "wing {} bytes exceeds max {}",
            wing.len(),
            WING_BYTES_MAX
        );

        let now = Utc::now();
        Self {
            id: format!("{}{}", UNIT_ID_PREFIX, &Uuid::new_v4().to_string()[..8]),
            unit_number,
            wing,
            floor,
            status: UnitStatus::Available,
            temperature,
            capacity,
            occupant: None,
            last_maintenance: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the unit can take an assignment.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self.status, UnitStatus::Available)
    }

    /// Occupant is present iff status is `occupied`.
    #[must_use]
    pub fn occupant_consistent(&self) -> bool {
        self.occupant.is_some() == matches!(self.status, UnitStatus::Occupied)
    }

    /// Bind an occupant to this unit.
    fn bind(&mut self, occupant: Occupant) {
        assert!(self.is_available(), "can only assign an available unit");
        assert!(
            occupant.name.len() <= OCCUPANT_NAME_BYTES_MAX,
            "occupant name {} bytes exceeds max {}",
            occupant.name.len(),
            OCCUPANT_NAME_BYTES_MAX
        );
        self.status = UnitStatus::Occupied;
        self.occupant = Some(occupant);
        self.updated_at = Utc::now();
        debug_assert!(self.occupant_consistent());
    }

    /// Clear the occupant, returning the prior binding.
    fn unbind(&mut self) -> Occupant {
        assert!(
            matches!(self.status, UnitStatus::Occupied),
            "can only release an occupied unit"
        );
        self.status = UnitStatus::Available;
        self.updated_at = Utc::now();
        let occupant = self.occupant.take().expect("occupied unit has an occupant");
        debug_assert!(self.occupant_consistent());
        occupant
    }

    /// Move the unit in or out of maintenance.
    fn toggle_maintenance(&mut self, flag: bool) {
        assert!(
            !matches!(self.status, UnitStatus::Occupied),
            "cannot toggle maintenance on an occupied unit"
        );
        if flag {
            self.status = UnitStatus::Maintenance;
            self.last_maintenance = Some(Utc::now().date_naive());
        } else {
            self.status = UnitStatus::Available;
        }
        self.updated_at = Utc::now();
        debug_assert!(self.occupant_consistent());
    }
}

// =============================================================================
// Occupancy Summary
// =============================================================================

/// Per-wing occupancy breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WingOccupancy {
    /// Wing name
    pub wing: String,
    /// Occupied units in the wing
    pub occupied: usize,
    /// Available units in the wing
    pub available: usize,
    /// All units in the wing, including maintenance
    pub total: usize,
}

/// Registry-wide occupancy snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySummary {
    /// All units
    pub total: usize,
    /// Units holding a body
    pub occupied: usize,
    /// Units ready for assignment
    pub available: usize,
    /// Units out of service
    pub maintenance: usize,
    /// Occupied over total, rounded, 0 when the registry is empty
    pub utilization_pct: u32,
    /// Breakdown by wing, ordered by wing name
    pub wings: Vec<WingOccupancy>,
}

// =============================================================================
// Storage Store
// =============================================================================

/// In-memory registry of storage units.
#[derive(Debug, Default)]
pub struct StorageStore {
    /// Units by ID
    units: HashMap<String, StorageUnit>,
    /// Index: unit number -> unit ID
    by_number: HashMap<String, String>,
}

impl StorageStore {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a unit into the registry.
    pub fn insert(&mut self, unit: StorageUnit) -> Result<(), StorageError> {
        if self.units.len() >= UNITS_COUNT_MAX {
            return Err(StorageError::RegistryFull {
                count: self.units.len(),
                max: UNITS_COUNT_MAX,
            });
        }
        if self.by_number.contains_key(&unit.unit_number) {
            return Err(StorageError::DuplicateUnitNumber(unit.unit_number.clone()));
        }

        self.by_number.insert(unit.unit_number.clone(), unit.id.clone());
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StorageUnit> {
        self.units.get(id)
    }

    /// Look a unit up by its unit number.
    #[must_use]
    pub fn get_by_number(&self, unit_number: &str) -> Option<&StorageUnit> {
        self.by_number.get(unit_number).and_then(|id| self.units.get(id))
    }

    /// All units, ordered by unit number.
    #[must_use]
    pub fn list(&self) -> Vec<&StorageUnit> {
        let mut units: Vec<&StorageUnit> = self.units.values().collect();
        units.sort_by(|a, b| a.unit_number.cmp(&b.unit_number));
        units
    }

    /// Number of units in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True when the registry holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Bind a deceased record to an available unit.
    ///
    /// Stamps `date_admitted` with today. The unit must be `available`:
    /// an occupied or maintenance unit rejects the assignment and is left
    /// untouched.
    pub fn assign(
        &mut self,
        unit_id: &str,
        record_id: String,
        name: String,
        deadline: Option<NaiveDate>,
    ) -> Result<StorageUnit, StorageError> {
        let unit = self
            .units
            .get_mut(unit_id)
            .ok_or_else(|| StorageError::NotFound(unit_id.to_string()))?;

        if !unit.is_available() {
            return Err(StorageError::NotAvailable {
                unit_id: unit_id.to_string(),
                status: unit.status,
            });
        }

        unit.bind(Occupant {
            record_id,
            name,
            date_admitted: Utc::now().date_naive(),
            storage_deadline: deadline,
        });
        Ok(unit.clone())
    }

    /// Release an occupied unit back to `available`.
    ///
    /// Returns the updated unit and the prior occupant so callers can update
    /// the linked record. No deadline rule is evaluated; release is
    /// operator-initiated and unconditional for occupied units.
    pub fn release(&mut self, unit_id: &str) -> Result<(StorageUnit, Occupant), StorageError> {
        let unit = self
            .units
            .get_mut(unit_id)
            .ok_or_else(|| StorageError::NotFound(unit_id.to_string()))?;

        if !matches!(unit.status, UnitStatus::Occupied) {
            return Err(StorageError::NotOccupied(unit_id.to_string()));
        }

        let occupant = unit.unbind();
        Ok((unit.clone(), occupant))
    }

    /// Move a unit in (`flag = true`) or out (`flag = false`) of maintenance.
    ///
    /// An occupied unit rejects the toggle; release it first. Entering
    /// maintenance stamps `last_maintenance` with today; leaving does not.
    pub fn set_maintenance(&mut self, unit_id: &str, flag: bool) -> Result<StorageUnit, StorageError> {
        let unit = self
            .units
            .get_mut(unit_id)
            .ok_or_else(|| StorageError::NotFound(unit_id.to_string()))?;

        if matches!(unit.status, UnitStatus::Occupied) {
            return Err(StorageError::Occupied(unit_id.to_string()));
        }

        unit.toggle_maintenance(flag);
        Ok(unit.clone())
    }

    /// Registry-wide occupancy snapshot, wings ordered by name.
    #[must_use]
    pub fn summary(&self) -> OccupancySummary {
        let mut occupied = 0;
        let mut available = 0;
        let mut maintenance = 0;
        let mut wings: HashMap<&str, WingOccupancy> = HashMap::new();

        for unit in self.units.values() {
            match unit.status {
                UnitStatus::Occupied => occupied += 1,
                UnitStatus::Available => available += 1,
                UnitStatus::Maintenance => maintenance += 1,
            }

            let entry = wings.entry(unit.wing.as_str()).or_insert_with(|| WingOccupancy {
                wing: unit.wing.clone(),
                occupied: 0,
                available: 0,
                total: 0,
            });
            entry.total += 1;
            match unit.status {
                UnitStatus::Occupied => entry.occupied += 1,
                UnitStatus::Available => entry.available += 1,
                UnitStatus::Maintenance => {}
            }
        }

        let total = self.units.len();
        let utilization_pct = if total == 0 {
            0
        } else {
            (occupied as f64 / total as f64 * 100.0).round() as u32
        };

        let mut wings: Vec<WingOccupancy> = wings.into_values().collect();
        wings.sort_by(|a, b| a.wing.cmp(&b.wing));

        OccupancySummary {
            total,
            occupied,
            available,
            maintenance,
            utilization_pct,
            wings,
        }
    }
}

/// Thread-safe storage registry
pub type SharedStorageStore = Arc<RwLock<StorageStore>>;

/// Create a new shared storage registry
#[must_use]
pub fn new_shared_store() -> SharedStorageStore {
    Arc::new(RwLock::new(StorageStore::new()))
}

// =============================================================================
// Errors
// =============================================================================

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("registry is full: {count} >= {max}")]
    RegistryFull { count: usize, max: usize },

    #[error("unit number already exists: {0}")]
    DuplicateUnitNumber(String),

    #[error("storage unit not found: {0}")]
    NotFound(String),

    #[error("unit {unit_id} is not available (status: {status})")]
    NotAvailable { unit_id: String, status: UnitStatus },

    #[error("unit {0} is not occupied")]
    NotOccupied(String),

    #[error("unit {0} is occupied")]
    Occupied(String),
}

// =============================================================================
// Tests
// =============================================================================

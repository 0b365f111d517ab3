//! Unit Search Projection
//!
//! Read-only view over the registry for operator search: a free-text query
//! over unit number and occupant fields plus categorical wing and status
//! filters. Recomputed on every call; input order is preserved.

use crate::storage::{StorageUnit, UnitStatus};

// =============================================================================
// Types
// =============================================================================

/// Filter inputs for the unit search view.
///
/// `None` on wing or status means no filter, matching the `"all"` sentinel
/// the operator UI sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    /// Case-insensitive substring query; empty matches everything
    pub query: String,
    /// Exact wing match, or `None` for all wings
    pub wing: Option<String>,
    /// Exact status match, or `None` for all statuses
    pub status: Option<UnitStatus>,
}

impl UnitFilter {
    /// Filter that matches every unit.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from raw operator inputs, treating `"all"` (any case)
    /// and empty strings as no-filter sentinels. An unknown status string is
    /// ignored rather than matching nothing.
    #[must_use]
    pub fn from_params(query: &str, wing: &str, status: &str) -> Self {
        let wing = match wing {
            "" => None,
            w if w.eq_ignore_ascii_case("all") => None,
            w => Some(w.to_string()),
        };
        let status = if status.is_empty() || status.eq_ignore_ascii_case("all") {
            None
        } else {
            UnitStatus::parse(status)
        };
        Self {
            query: query.to_string(),
            wing,
            status,
        }
    }

    /// True when the unit passes all three predicates.
    #[must_use]
    pub fn matches(&self, unit: &StorageUnit) -> bool {
        self.matches_query(unit) && self.matches_wing(unit) && self.matches_status(unit)
    }

    fn matches_query(&self, unit: &StorageUnit) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        if unit.unit_number.to_lowercase().contains(&needle) {
            return true;
        }
        match &unit.occupant {
            Some(occupant) => {
                occupant.name.to_lowercase().contains(&needle)
                    || occupant.record_id.to_lowercase().contains(&needle)
            }
            None => false,
        }
    }

    fn matches_wing(&self, unit: &StorageUnit) -> bool {
        match &self.wing {
            Some(wing) => unit.wing == *wing,
            None => true,
        }
    }

    fn matches_status(&self, unit: &StorageUnit) -> bool {
        match self.status {
            Some(status) => unit.status == status,
            None => true,
        }
    }
}

/// Apply a filter over a unit sequence, preserving input order.
#[must_use]
pub fn filter_units<'a>(units: &'a [StorageUnit], filter: &UnitFilter) -> Vec<&'a StorageUnit> {
    units.iter().filter(|u| filter.matches(u)).collect()
}

// =============================================================================
// Tests
// =============================================================================

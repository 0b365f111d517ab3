//! Deceased Record Keeping
//!
//! TigerStyle: Records are created `pending`, move to `processing` when a
//! body is assigned to a storage unit, and to `released` when the unit is
//! released. The record owns the biographical data; the storage registry
//! only holds a foreign reference plus a display-name snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Maximum full name length in bytes
pub const FULL_NAME_BYTES_MAX: usize = 150;

/// Maximum identification length in bytes
pub const IDENTIFICATION_BYTES_MAX: usize = 50;

/// Maximum cause-of-death length in bytes
pub const CAUSE_OF_DEATH_BYTES_MAX: usize = 255;

/// Maximum next-of-kin name length in bytes
pub const NEXT_OF_KIN_BYTES_MAX: usize = 100;

/// Maximum contact number length in bytes
pub const CONTACT_NUMBER_BYTES_MAX: usize = 30;

/// Maximum address length in bytes
pub const ADDRESS_BYTES_MAX: usize = 255;

/// Maximum number of records held in memory
pub const RECORDS_COUNT_MAX: usize = 10_000;

/// Record ID prefix for readability
pub const RECORD_ID_PREFIX: &str = "rec_";

// =============================================================================
// Types
// =============================================================================

/// Processing status of a deceased record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Admitted, not yet in storage
    Pending,
    /// In a storage unit
    Processing,
    /// Released from storage
    Released,
}

impl RecordStatus {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Released => "released",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "released" => Some(Self::Released),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Biographical fields captured at admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDetails {
    /// Date of birth, if known
    pub date_of_birth: Option<NaiveDate>,
    /// Gender
    pub gender: Option<String>,
    /// Government identification number
    pub identification: Option<String>,
    /// Cause of death as recorded
    pub cause_of_death: Option<String>,
    /// Next of kin name
    pub next_of_kin: Option<String>,
    /// Next of kin contact number
    pub contact_number: Option<String>,
    /// Last known address
    pub address: Option<String>,
    /// Religion, for service arrangements
    pub religion: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// A deceased individual's record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeceasedRecord {
    /// Unique record ID, never reused
    pub id: String,
    /// Full legal name
    pub full_name: String,
    /// Date of death
    pub date_of_death: NaiveDate,
    /// Biographical details
    pub details: RecordDetails,
    /// When the record was admitted
    pub admission_date: DateTime<Utc>,
    /// Processing status
    pub status: RecordStatus,
    /// Storage unit currently holding the body, if any
    pub storage_unit_id: Option<String>,
}

impl DeceasedRecord {
    /// Create a new record in `pending` status.
    ///
    /// # Panics
    /// Panics if any field exceeds its limit.
    #[must_use]
    pub fn new(full_name: String, date_of_death: NaiveDate, details: RecordDetails) -> Self {
        assert!(
            full_name.len() <= FULL_NAME_BYTES_MAX,
            "full name {} bytes exceeds max {}",
            full_name.len(),
            FULL_NAME_BYTES_MAX
        );
        if let Some(identification) = &details.identification {
            assert!(
                identification.len() <= IDENTIFICATION_BYTES_MAX,
                "identification {} bytes exceeds max {}",
                identification.len(),
                IDENTIFICATION_BYTES_MAX
            );
        }
        if let Some(cause) = &details.cause_of_death {
            assert!(
                cause.len() <= CAUSE_OF_DEATH_BYTES_MAX,
                "cause of death {} bytes exceeds max {}",
                cause.len(),
                CAUSE_OF_DEATH_BYTES_MAX
            );
        }
        if let Some(next_of_kin) = &details.next_of_kin {
            assert!(
                next_of_kin.len() <= NEXT_OF_KIN_BYTES_MAX,
                "next of kin {} bytes exceeds max {}",
                next_of_kin.len(),
                NEXT_OF_KIN_BYTES_MAX
            );
        }
        if let Some(contact) = &details.contact_number {
            assert!(
                contact.len() <= CONTACT_NUMBER_BYTES_MAX,
                "contact number {} bytes exceeds max {}",
                contact.len(),
                CONTACT_NUMBER_BYTES_MAX
            );
        }
        if let Some(address) = &details.address {
            assert!(
                address.len() <= ADDRESS_BYTES_MAX,
                "address {} bytes exceeds max {}",
                address.len(),
                ADDRESS_BYTES_MAX
            );
        }

        Self {
            id: format!("{}{}", RECORD_ID_PREFIX, &Uuid::new_v4().to_string()[..8]),
            full_name,
            date_of_death,
            details,
            admission_date: Utc::now(),
            status: RecordStatus::Pending,
            storage_unit_id: None,
        }
    }

    /// Check if the record is awaiting storage.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, RecordStatus::Pending)
    }
}

// =============================================================================
// Record Store
// =============================================================================

/// In-memory deceased record store.
#[derive(Debug, Default)]
pub struct RecordStore {
    /// Records by ID
    records: HashMap<String, DeceasedRecord>,
    /// Admission order, oldest first
    order: Vec<String>,
}

impl RecordStore {
    /// Create an empty record store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record.
    pub fn insert(&mut self, record: DeceasedRecord) -> Result<(), RecordError> {
        if self.records.len() >= RECORDS_COUNT_MAX {
            return Err(RecordError::StoreFull {
                count: self.records.len(),
                max: RECORDS_COUNT_MAX,
            });
        }
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Get a record by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DeceasedRecord> {
        self.records.get(id)
    }

    /// All records, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<&DeceasedRecord> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Number of records in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove a record.
    pub fn remove(&mut self, id: &str) -> Result<DeceasedRecord, RecordError> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;
        self.order.retain(|i| i != id);
        Ok(record)
    }

    /// Link a record to the storage unit now holding the body.
    pub fn mark_stored(&mut self, id: &str, unit_id: &str) -> Result<(), RecordError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;
        record.status = RecordStatus::Processing;
        record.storage_unit_id = Some(unit_id.to_string());
        Ok(())
    }

    /// Unlink a record from its storage unit after release.
    pub fn mark_released(&mut self, id: &str) -> Result<(), RecordError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;
        record.status = RecordStatus::Released;
        record.storage_unit_id = None;
        Ok(())
    }
}

/// Thread-safe record store
pub type SharedRecordStore = Arc<RwLock<RecordStore>>;

/// Create a new shared record store
#[must_use]
pub fn new_shared_store() -> SharedRecordStore {
    Arc::new(RwLock::new(RecordStore::new()))
}

// =============================================================================
// Errors
// =============================================================================

/// Record-keeping errors
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record store is full: {count} >= {max}")]
    StoreFull { count: usize, max: usize },

    #[error("record not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Tests
// =============================================================================

//! Wire Format
//!
//! Flat snake_case JSON shapes exchanged with API consumers, and the
//! mapping between them and the internal models. Date-valued fields travel
//! as ISO-8601 timestamps and are truncated to date-only on ingestion; a
//! domain date serializes as midnight UTC.
//!
//! The from-wire unit mapping enforces occupant/status coherence so the
//! occupant-iff-occupied invariant survives ingestion.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{DeceasedRecord, RecordDetails, RecordStatus};
use crate::schedule::{FuneralEvent, ServiceType};
use crate::storage::{Capacity, Occupant, StorageUnit, UnitStatus};

// =============================================================================
// Helpers
// =============================================================================

/// Serialize a domain date as a midnight-UTC timestamp.
fn date_to_wire(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc()
}

/// Truncate a wire timestamp to date-only.
fn date_from_wire(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Generic error body: the only structured error contract on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short human-readable failure description
    pub detail: String,
}

// =============================================================================
// Storage Units
// =============================================================================

/// A storage unit as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireStorageUnit {
    pub id: String,
    pub unit_number: String,
    pub wing: String,
    pub floor: i32,
    pub status: String,
    pub temperature: f64,
    pub capacity: String,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub occupant_id: Option<String>,
    pub occupant_name: Option<String>,
    pub date_admitted: Option<DateTime<Utc>>,
    pub storage_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provisioning payload for a new unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireUnitCreate {
    pub unit_number: String,
    pub wing: String,
    pub floor: i32,
    pub temperature: f64,
    /// Defaults to `single` when omitted
    pub capacity: Option<String>,
}

/// Flatten a unit into its wire shape.
#[must_use]
pub fn unit_to_wire(unit: &StorageUnit) -> WireStorageUnit {
    let occupant = unit.occupant.as_ref();
    WireStorageUnit {
        id: unit.id.clone(),
        unit_number: unit.unit_number.clone(),
        wing: unit.wing.clone(),
        floor: unit.floor,
        status: unit.status.to_string(),
        temperature: unit.temperature,
        capacity: unit.capacity.to_string(),
        last_maintenance: unit.last_maintenance.map(date_to_wire),
        occupant_id: occupant.map(|o| o.record_id.clone()),
        occupant_name: occupant.map(|o| o.name.clone()),
        date_admitted: occupant.map(|o| date_to_wire(o.date_admitted)),
        storage_deadline: occupant.and_then(|o| o.storage_deadline.map(date_to_wire)),
        created_at: unit.created_at,
        updated_at: unit.updated_at,
    }
}

/// Rebuild a unit from its wire shape.
///
/// Occupant sub-fields must cohere with the status: an occupied row missing
/// any of them, or a non-occupied row carrying them, is rejected.
pub fn unit_from_wire(wire: WireStorageUnit) -> Result<StorageUnit, WireError> {
    let status = UnitStatus::parse(&wire.status)
        .ok_or_else(|| WireError::InvalidStatus(wire.status.clone()))?;
    let capacity = Capacity::parse(&wire.capacity)
        .ok_or_else(|| WireError::InvalidCapacity(wire.capacity.clone()))?;

    let occupant = match status {
        UnitStatus::Occupied => {
            let (Some(record_id), Some(name), Some(date_admitted)) =
                (wire.occupant_id, wire.occupant_name, wire.date_admitted)
            else {
                return Err(WireError::IncoherentOccupant(wire.id));
            };
            Some(Occupant {
                record_id,
                name,
                date_admitted: date_from_wire(date_admitted),
                storage_deadline: wire.storage_deadline.map(date_from_wire),
            })
        }
        UnitStatus::Available | UnitStatus::Maintenance => {
            if wire.occupant_id.is_some() || wire.occupant_name.is_some() {
                return Err(WireError::IncoherentOccupant(wire.id));
            }
            None
        }
    };

    let unit = StorageUnit {
        id: wire.id,
        unit_number: wire.unit_number,
        wing: wire.wing,
        floor: wire.floor,
        status,
        temperature: wire.temperature,
        capacity,
        occupant,
        last_maintenance: wire.last_maintenance.map(date_from_wire),
        created_at: wire.created_at,
        updated_at: wire.updated_at,
    };
    debug_assert!(unit.occupant_consistent());
    Ok(unit)
}

// =============================================================================
// Deceased Records
// =============================================================================

/// A deceased record as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireDeceasedRecord {
    pub id: String,
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub date_of_death: DateTime<Utc>,
    pub gender: Option<String>,
    pub identification: Option<String>,
    pub cause_of_death: Option<String>,
    pub next_of_kin: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub religion: Option<String>,
    pub notes: Option<String>,
    pub admission_date: DateTime<Utc>,
    pub status: String,
    pub storage_unit_id: Option<String>,
}

/// Admission payload for a new deceased record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecordCreate {
    pub full_name: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub date_of_death: DateTime<Utc>,
    pub gender: Option<String>,
    pub identification: Option<String>,
    pub cause_of_death: Option<String>,
    pub next_of_kin: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub religion: Option<String>,
    pub notes: Option<String>,
}

/// Flatten a record into its wire shape.
#[must_use]
pub fn record_to_wire(record: &DeceasedRecord) -> WireDeceasedRecord {
    WireDeceasedRecord {
        id: record.id.clone(),
        full_name: record.full_name.clone(),
        date_of_birth: record.details.date_of_birth.map(date_to_wire),
        date_of_death: date_to_wire(record.date_of_death),
        gender: record.details.gender.clone(),
        identification: record.details.identification.clone(),
        cause_of_death: record.details.cause_of_death.clone(),
        next_of_kin: record.details.next_of_kin.clone(),
        contact_number: record.details.contact_number.clone(),
        address: record.details.address.clone(),
        religion: record.details.religion.clone(),
        notes: record.details.notes.clone(),
        admission_date: record.admission_date,
        status: record.status.to_string(),
        storage_unit_id: record.storage_unit_id.clone(),
    }
}

/// Rebuild a record from its wire shape.
pub fn record_from_wire(wire: WireDeceasedRecord) -> Result<DeceasedRecord, WireError> {
    let status = RecordStatus::parse(&wire.status)
        .ok_or_else(|| WireError::InvalidStatus(wire.status.clone()))?;
    Ok(DeceasedRecord {
        id: wire.id,
        full_name: wire.full_name,
        date_of_death: date_from_wire(wire.date_of_death),
        details: RecordDetails {
            date_of_birth: wire.date_of_birth.map(date_from_wire),
            gender: wire.gender,
            identification: wire.identification,
            cause_of_death: wire.cause_of_death,
            next_of_kin: wire.next_of_kin,
            contact_number: wire.contact_number,
            address: wire.address,
            religion: wire.religion,
            notes: wire.notes,
        },
        admission_date: wire.admission_date,
        status,
        storage_unit_id: wire.storage_unit_id,
    })
}

/// Details carried by an admission payload.
#[must_use]
pub fn details_from_create(payload: &WireRecordCreate) -> RecordDetails {
    RecordDetails {
        date_of_birth: payload.date_of_birth.map(date_from_wire),
        gender: payload.gender.clone(),
        identification: payload.identification.clone(),
        cause_of_death: payload.cause_of_death.clone(),
        next_of_kin: payload.next_of_kin.clone(),
        contact_number: payload.contact_number.clone(),
        address: payload.address.clone(),
        religion: payload.religion.clone(),
        notes: payload.notes.clone(),
    }
}

// =============================================================================
// Funeral Events
// =============================================================================

/// A scheduled service as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFuneralEvent {
    pub id: String,
    pub deceased_name: String,
    pub service_type: String,
    pub date: NaiveDate,
    pub time: chrono::NaiveTime,
    pub location: String,
    pub officiant: Option<String>,
    pub expected_attendees: Option<u32>,
    pub notes: Option<String>,
}

/// Scheduling payload for a new or updated service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEventCreate {
    pub deceased_name: String,
    pub service_type: String,
    pub date: NaiveDate,
    pub time: chrono::NaiveTime,
    pub location: String,
    pub officiant: Option<String>,
    pub expected_attendees: Option<u32>,
    pub notes: Option<String>,
}

/// Flatten an event into its wire shape.
#[must_use]
pub fn event_to_wire(event: &FuneralEvent) -> WireFuneralEvent {
    WireFuneralEvent {
        id: event.id.clone(),
        deceased_name: event.deceased_name.clone(),
        service_type: event.service_type.to_string(),
        date: event.date,
        time: event.time,
        location: event.location.clone(),
        officiant: event.officiant.clone(),
        expected_attendees: event.expected_attendees,
        notes: event.notes.clone(),
    }
}

/// Build a fresh event from a scheduling payload.
pub fn event_from_create(payload: WireEventCreate) -> Result<FuneralEvent, WireError> {
    let service_type = ServiceType::parse(&payload.service_type)
        .ok_or_else(|| WireError::InvalidServiceType(payload.service_type.clone()))?;
    let mut event = FuneralEvent::new(
        payload.deceased_name,
        service_type,
        payload.date,
        payload.time,
        payload.location,
    );
    event.officiant = payload.officiant;
    event.expected_attendees = payload.expected_attendees;
    event.notes = payload.notes;
    Ok(event)
}

// =============================================================================
// Errors
// =============================================================================

/// Wire-mapping errors
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("invalid service type: {0}")]
    InvalidServiceType(String),

    #[error("unit {0} occupant fields do not match its status")]
    IncoherentOccupant(String),
}

// =============================================================================
// Tests
// =============================================================================

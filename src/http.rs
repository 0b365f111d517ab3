//! HTTP API
//!
//! The REST surface over the shared stores. Paths and semantics follow the
//! operator console's API: `/storage` for the unit registry and its
//! lifecycle operations, `/deceased` for record keeping, `/schedule` for
//! funeral services, `/notifications` for the operator feed.
//!
//! Failures surface as a status code plus a `{detail}` body; handlers never
//! panic and a failed mutation leaves every store in its prior state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::notify::{
    self, new_shared_store as new_notification_store, SharedNotificationStore,
};
use crate::records::{
    new_shared_store as new_record_store, DeceasedRecord, SharedRecordStore, FULL_NAME_BYTES_MAX,
};
use crate::schedule::{new_shared_store as new_schedule_store, SharedScheduleStore, DECEASED_NAME_BYTES_MAX, LOCATION_BYTES_MAX};
use crate::storage::{
    new_shared_store as new_storage_store, SharedStorageStore, StorageError, StorageUnit,
    CAPACITY_ALERT_THRESHOLD_PCT, UNIT_NUMBER_BYTES_MAX, WING_BYTES_MAX,
};
use crate::wire::{
    self, ErrorBody, WireEventCreate, WireRecordCreate, WireUnitCreate,
};

// =============================================================================
// Application State
// =============================================================================

/// Shared stores handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Storage unit registry
    pub storage: SharedStorageStore,
    /// Deceased records
    pub records: SharedRecordStore,
    /// Funeral schedule
    pub schedule: SharedScheduleStore,
    /// Operator notification feed
    pub notifications: SharedNotificationStore,
}

impl AppState {
    /// Create application state with empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: new_storage_store(),
            records: new_record_store(),
            schedule: new_schedule_store(),
            notifications: new_notification_store(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/storage", get(list_storage).post(create_storage))
        .route("/storage/summary", get(storage_summary))
        .route("/storage/:unit_id/assign", post(assign_unit))
        .route("/storage/:unit_id/release", patch(release_unit))
        .route("/storage/:unit_id/maintenance", patch(set_maintenance))
        .route("/deceased", get(list_deceased).post(create_deceased))
        .route("/deceased/:record_id", get(get_deceased).delete(delete_deceased))
        .route("/schedule", get(list_events).post(schedule_event))
        .route("/schedule/:event_id", patch(update_event).delete(cancel_event))
        .route("/notifications", get(list_notifications).delete(clear_notifications))
        .route("/notifications/read-all", patch(mark_all_notifications_read))
        .route("/notifications/:id/read", patch(mark_notification_read))
        .route("/notifications/:id", delete(dismiss_notification))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// A handler failure: status code plus the `{detail}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => Self::not_found(err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<crate::records::RecordError> for ApiError {
    fn from(err: crate::records::RecordError) -> Self {
        match err {
            crate::records::RecordError::NotFound(_) => Self::not_found(err.to_string()),
            crate::records::RecordError::StoreFull { .. } => Self::bad_request(err.to_string()),
        }
    }
}

impl From<crate::schedule::ScheduleError> for ApiError {
    fn from(err: crate::schedule::ScheduleError) -> Self {
        match err {
            crate::schedule::ScheduleError::NotFound(_) => Self::not_found(err.to_string()),
            crate::schedule::ScheduleError::ScheduleFull { .. } => Self::bad_request(err.to_string()),
        }
    }
}

impl From<crate::notify::NotifyError> for ApiError {
    fn from(err: crate::notify::NotifyError) -> Self {
        Self::not_found(err.to_string())
    }
}

impl From<crate::wire::WireError> for ApiError {
    fn from(err: crate::wire::WireError) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// Reject an over-long field before it reaches a constructor assert.
fn ensure_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.len() > max {
        return Err(ApiError::bad_request(format!(
            "{field} exceeds {max} bytes"
        )));
    }
    Ok(())
}

// =============================================================================
// Root
// =============================================================================

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Mortuary operations API running" }))
}

// =============================================================================
// Storage Handlers
// =============================================================================

async fn list_storage(State(state): State<AppState>) -> Json<Vec<wire::WireStorageUnit>> {
    let storage = state.storage.read().await;
    Json(storage.list().into_iter().map(wire::unit_to_wire).collect())
}

async fn storage_summary(State(state): State<AppState>) -> Json<crate::storage::OccupancySummary> {
    let storage = state.storage.read().await;
    Json(storage.summary())
}

async fn create_storage(
    State(state): State<AppState>,
    Json(payload): Json<WireUnitCreate>,
) -> Result<Json<wire::WireStorageUnit>, ApiError> {
    ensure_len("unit_number", &payload.unit_number, UNIT_NUMBER_BYTES_MAX)?;
    ensure_len("wing", &payload.wing, WING_BYTES_MAX)?;
    let capacity = match payload.capacity.as_deref() {
        None => crate::storage::Capacity::Single,
        Some(raw) => crate::storage::Capacity::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("invalid capacity: {raw}")))?,
    };

    let unit = StorageUnit::new(
        payload.unit_number,
        payload.wing,
        payload.floor,
        payload.temperature,
        capacity,
    );
    let response = wire::unit_to_wire(&unit);

    let mut storage = state.storage.write().await;
    storage.insert(unit)?;
    tracing::info!("provisioned unit {}", response.unit_number);
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct AssignBody {
    deceased_id: String,
}

#[derive(Debug, Deserialize)]
struct AssignQuery {
    deadline: Option<NaiveDate>,
}

async fn assign_unit(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
    Query(query): Query<AssignQuery>,
    Json(body): Json<AssignBody>,
) -> Result<Json<wire::WireStorageUnit>, ApiError> {
    // the record is authoritative for the denormalized occupant name
    let record = {
        let records = state.records.read().await;
        records.get(&body.deceased_id).cloned()
    }
    .ok_or_else(|| ApiError::not_found("Deceased record not found"))?;

    let (updated, capacity_notice) = {
        let mut storage = state.storage.write().await;
        let before_pct = storage.summary().utilization_pct;
        let updated = storage.assign(
            &unit_id,
            record.id.clone(),
            record.full_name.clone(),
            query.deadline,
        )?;
        let after_pct = storage.summary().utilization_pct;
        let crossed = before_pct < CAPACITY_ALERT_THRESHOLD_PCT
            && after_pct >= CAPACITY_ALERT_THRESHOLD_PCT;
        let alert = if crossed {
            let units: Vec<StorageUnit> = storage.list().into_iter().cloned().collect();
            notify::capacity_alert(&units)
        } else {
            None
        };
        (updated, alert)
    };

    {
        let mut records = state.records.write().await;
        records.mark_stored(&record.id, &updated.id)?;
    }

    if let Some(alert) = capacity_notice {
        state.notifications.write().await.push(alert);
    }

    tracing::info!("assigned record {} to unit {}", record.id, updated.unit_number);
    Ok(Json(wire::unit_to_wire(&updated)))
}

async fn release_unit(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> Result<Json<wire::WireStorageUnit>, ApiError> {
    let (updated, occupant) = {
        let mut storage = state.storage.write().await;
        storage.release(&unit_id)?
    };

    // the record may have been deleted since assignment; the registry does
    // not validate record existence
    let mut records = state.records.write().await;
    if records.mark_released(&occupant.record_id).is_err() {
        tracing::debug!("released unit {} had no backing record {}", unit_id, occupant.record_id);
    }

    tracing::info!("released unit {}", updated.unit_number);
    Ok(Json(wire::unit_to_wire(&updated)))
}

#[derive(Debug, Deserialize)]
struct MaintenanceQuery {
    maintenance: Option<bool>,
}

async fn set_maintenance(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
    Query(query): Query<MaintenanceQuery>,
) -> Result<Json<wire::WireStorageUnit>, ApiError> {
    let flag = query.maintenance.unwrap_or(true);
    let updated = {
        let mut storage = state.storage.write().await;
        storage.set_maintenance(&unit_id, flag)?
    };

    state
        .notifications
        .write()
        .await
        .push(notify::maintenance_notice(&updated, flag));

    tracing::info!("unit {} maintenance set to {}", updated.unit_number, flag);
    Ok(Json(wire::unit_to_wire(&updated)))
}

// =============================================================================
// Deceased Handlers
// =============================================================================

async fn list_deceased(State(state): State<AppState>) -> Json<Vec<wire::WireDeceasedRecord>> {
    let records = state.records.read().await;
    Json(records.list().into_iter().map(wire::record_to_wire).collect())
}

async fn create_deceased(
    State(state): State<AppState>,
    Json(payload): Json<WireRecordCreate>,
) -> Result<Json<wire::WireDeceasedRecord>, ApiError> {
    ensure_len("full_name", &payload.full_name, FULL_NAME_BYTES_MAX)?;
    let details = wire::details_from_create(&payload);
    if let Some(identification) = &details.identification {
        ensure_len("identification", identification, crate::records::IDENTIFICATION_BYTES_MAX)?;
    }
    if let Some(cause) = &details.cause_of_death {
        ensure_len("cause_of_death", cause, crate::records::CAUSE_OF_DEATH_BYTES_MAX)?;
    }
    if let Some(next_of_kin) = &details.next_of_kin {
        ensure_len("next_of_kin", next_of_kin, crate::records::NEXT_OF_KIN_BYTES_MAX)?;
    }
    if let Some(contact) = &details.contact_number {
        ensure_len("contact_number", contact, crate::records::CONTACT_NUMBER_BYTES_MAX)?;
    }
    if let Some(address) = &details.address {
        ensure_len("address", address, crate::records::ADDRESS_BYTES_MAX)?;
    }

    let record = DeceasedRecord::new(
        payload.full_name,
        payload.date_of_death.date_naive(),
        details,
    );
    let response = wire::record_to_wire(&record);

    let mut records = state.records.write().await;
    records.insert(record)?;
    tracing::info!("admitted record {}", response.id);
    Ok(Json(response))
}

async fn get_deceased(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<Json<wire::WireDeceasedRecord>, ApiError> {
    let records = state.records.read().await;
    let record = records
        .get(&record_id)
        .ok_or_else(|| ApiError::not_found("Record not found"))?;
    Ok(Json(wire::record_to_wire(record)))
}

async fn delete_deceased(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut records = state.records.write().await;
    records.remove(&record_id)?;
    Ok(Json(json!({ "message": format!("Record {record_id} deleted successfully") })))
}

// =============================================================================
// Schedule Handlers
// =============================================================================

async fn list_events(State(state): State<AppState>) -> Json<Vec<wire::WireFuneralEvent>> {
    let schedule = state.schedule.read().await;
    Json(schedule.list().into_iter().map(wire::event_to_wire).collect())
}

async fn schedule_event(
    State(state): State<AppState>,
    Json(payload): Json<WireEventCreate>,
) -> Result<Json<wire::WireFuneralEvent>, ApiError> {
    ensure_len("deceased_name", &payload.deceased_name, DECEASED_NAME_BYTES_MAX)?;
    ensure_len("location", &payload.location, LOCATION_BYTES_MAX)?;
    let event = wire::event_from_create(payload)?;
    let response = wire::event_to_wire(&event);

    let conflicted = {
        let mut schedule = state.schedule.write().await;
        let conflicted = !schedule.conflicts(&event).is_empty();
        schedule.schedule(event.clone())?;
        conflicted
    };

    // the clash is flagged, not blocked; the operator resolves it
    if conflicted {
        state
            .notifications
            .write()
            .await
            .push(notify::schedule_conflict_notice(&event));
    }

    tracing::info!("scheduled {} service for {}", event.service_type, event.deceased_name);
    Ok(Json(response))
}

async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(payload): Json<WireEventCreate>,
) -> Result<Json<wire::WireFuneralEvent>, ApiError> {
    ensure_len("deceased_name", &payload.deceased_name, DECEASED_NAME_BYTES_MAX)?;
    ensure_len("location", &payload.location, LOCATION_BYTES_MAX)?;
    let event = wire::event_from_create(payload)?;

    let mut schedule = state.schedule.write().await;
    let updated = schedule.update(&event_id, event)?;
    Ok(Json(wire::event_to_wire(&updated)))
}

async fn cancel_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<wire::WireFuneralEvent>, ApiError> {
    let mut schedule = state.schedule.write().await;
    let cancelled = schedule.cancel(&event_id)?;
    tracing::info!("cancelled service {}", cancelled.id);
    Ok(Json(wire::event_to_wire(&cancelled)))
}

// =============================================================================
// Notification Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct NotificationQuery {
    unread: Option<bool>,
}

async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Json<Vec<crate::notify::Notification>> {
    let notifications = state.notifications.read().await;
    let listed = if query.unread.unwrap_or(false) {
        notifications.unread()
    } else {
        notifications.list()
    };
    Json(listed.into_iter().cloned().collect())
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut notifications = state.notifications.write().await;
    notifications.mark_read(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_all_notifications_read(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut notifications = state.notifications.write().await;
    let marked = notifications.mark_all_read();
    Json(json!({ "marked": marked }))
}

async fn dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut notifications = state.notifications.write().await;
    notifications.dismiss(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Json<serde_json::Value> {
    let mut notifications = state.notifications.write().await;
    let cleared = if query.unread.unwrap_or(false) {
        notifications.clear_unread()
    } else {
        notifications.clear_all()
    };
    Json(json!({ "cleared": cleared }))
}

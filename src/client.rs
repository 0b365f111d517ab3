//! API Client and Cached Registry
//!
//! `ApiClient` is a thin typed wrapper over the REST surface. `Registry` is
//! the operator-console view of the unit set: a locally cached copy that
//! reconciles with the service by merging fetched units by id, and mutates
//! only after server confirmation (no optimistic writes).
//!
//! Each operation is a single outstanding request; nothing here queues,
//! retries, or cancels. The server is authoritative.

use chrono::{NaiveDate, Utc};
use serde_json::json;

use crate::filter::{filter_units, UnitFilter};
use crate::storage::StorageUnit;
use crate::wire::{
    unit_from_wire, ErrorBody, WireDeceasedRecord, WireError, WireRecordCreate, WireStorageUnit,
    WireUnitCreate,
};

// =============================================================================
// API Client
// =============================================================================

/// Typed client for the mortuary operations API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client against a base URL such as `http://localhost:8000`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Turn a non-2xx response into an API error, recovering the `detail`
    /// message when the body carries one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.detail)
            .unwrap_or_else(|_| "request failed".to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    /// Fetch the full unit set.
    pub async fn fetch_storage_units(&self) -> Result<Vec<WireStorageUnit>, ClientError> {
        let response = self
            .http
            .get(format!("{}/storage", self.base_url))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Provision a new unit.
    pub async fn create_storage_unit(
        &self,
        payload: &WireUnitCreate,
    ) -> Result<WireStorageUnit, ClientError> {
        let response = self
            .http
            .post(format!("{}/storage", self.base_url))
            .json(payload)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Bind a deceased record to a unit, with an optional deadline query.
    pub async fn assign_to_unit(
        &self,
        unit_id: &str,
        deceased_id: &str,
        deadline: Option<NaiveDate>,
    ) -> Result<WireStorageUnit, ClientError> {
        let mut request = self
            .http
            .post(format!("{}/storage/{}/assign", self.base_url, unit_id))
            .json(&json!({ "deceased_id": deceased_id }));
        if let Some(deadline) = deadline {
            request = request.query(&[("deadline", deadline.to_string())]);
        }
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Release an occupied unit.
    pub async fn release_unit(&self, unit_id: &str) -> Result<WireStorageUnit, ClientError> {
        let response = self
            .http
            .patch(format!("{}/storage/{}/release", self.base_url, unit_id))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Move a unit in or out of maintenance.
    pub async fn set_maintenance(
        &self,
        unit_id: &str,
        maintenance: bool,
    ) -> Result<WireStorageUnit, ClientError> {
        let response = self
            .http
            .patch(format!(
                "{}/storage/{}/maintenance?maintenance={}",
                self.base_url, unit_id, maintenance
            ))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Fetch all deceased records.
    pub async fn fetch_deceased_records(&self) -> Result<Vec<WireDeceasedRecord>, ClientError> {
        let response = self
            .http
            .get(format!("{}/deceased", self.base_url))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Admit a new deceased record.
    pub async fn add_deceased_record(
        &self,
        payload: &WireRecordCreate,
    ) -> Result<WireDeceasedRecord, ClientError> {
        let response = self
            .http
            .post(format!("{}/deceased", self.base_url))
            .json(payload)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Client-side cached copy of the unit set.
#[derive(Debug, Default)]
pub struct Registry {
    units: Vec<StorageUnit>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Units in server order.
    #[must_use]
    pub fn units(&self) -> &[StorageUnit] {
        &self.units
    }

    /// Get a cached unit by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StorageUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Filtered view over the cache, in cache order.
    #[must_use]
    pub fn filtered(&self, filter: &UnitFilter) -> Vec<&StorageUnit> {
        filter_units(&self.units, filter)
    }

    /// Reconcile with a fetched unit set, merging by id.
    ///
    /// The fetched order wins, ids absent from the fetch are dropped, new
    /// ids are taken in fetch order. A cached entry newer than its fetched
    /// counterpart is kept, so a confirmed mutation applied while the fetch
    /// was in flight is not clobbered by a stale response.
    pub fn merge(&mut self, fetched: Vec<StorageUnit>) {
        let previous = std::mem::take(&mut self.units);
        self.units = fetched
            .into_iter()
            .map(|incoming| {
                match previous.iter().find(|u| u.id == incoming.id) {
                    Some(cached) if cached.updated_at > incoming.updated_at => cached.clone(),
                    _ => incoming,
                }
            })
            .collect();
    }

    /// Replace the single cached entry matching the unit's id; every other
    /// entry is untouched. An unknown id is appended.
    pub fn apply_update(&mut self, unit: StorageUnit) {
        match self.units.iter_mut().find(|u| u.id == unit.id) {
            Some(cached) => *cached = unit,
            None => self.units.push(unit),
        }
    }

    /// Fetch the full unit set and reconcile.
    ///
    /// On failure the cache keeps its previous contents.
    pub async fn load(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let fetched = client.fetch_storage_units().await?;
        let mut units = Vec::with_capacity(fetched.len());
        for wire in fetched {
            units.push(unit_from_wire(wire)?);
        }
        self.merge(units);
        Ok(())
    }

    /// Assign a record to a unit, applying the confirmed result.
    ///
    /// Pre-flight checks reject a missing record id and a deadline before
    /// today; neither sends a request. Local state mutates only after the
    /// server confirms.
    pub async fn assign(
        &mut self,
        client: &ApiClient,
        unit_id: &str,
        record_id: &str,
        deadline: NaiveDate,
    ) -> Result<StorageUnit, ClientError> {
        if record_id.is_empty() {
            return Err(ClientError::MissingInput("record"));
        }
        if deadline < Utc::now().date_naive() {
            return Err(ClientError::DeadlineInPast(deadline));
        }

        let wire = client.assign_to_unit(unit_id, record_id, Some(deadline)).await?;
        let unit = unit_from_wire(wire)?;
        self.apply_update(unit.clone());
        Ok(unit)
    }

    /// Release a unit, applying the confirmed result.
    pub async fn release(
        &mut self,
        client: &ApiClient,
        unit_id: &str,
    ) -> Result<StorageUnit, ClientError> {
        let wire = client.release_unit(unit_id).await?;
        let unit = unit_from_wire(wire)?;
        self.apply_update(unit.clone());
        Ok(unit)
    }

    /// Toggle maintenance on a unit, applying the confirmed result.
    pub async fn set_maintenance(
        &mut self,
        client: &ApiClient,
        unit_id: &str,
        maintenance: bool,
    ) -> Result<StorageUnit, ClientError> {
        let wire = client.set_maintenance(unit_id, maintenance).await?;
        let unit = unit_from_wire(wire)?;
        self.apply_update(unit.clone());
        Ok(unit)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Client-side errors: transport, application, and pre-flight input checks.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed with status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("storage deadline {0} is in the past")]
    DeadlineInPast(NaiveDate),

    #[error(transparent)]
    Wire(#[from] WireError),
}

// =============================================================================
// Tests
// =============================================================================

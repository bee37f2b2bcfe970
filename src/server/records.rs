//! Minimal tenant-scoped records surface
//!
//! The real records layer (patients, visits, prescriptions, billing) lives
//! in the wider platform; this slice exists so the middleware contract has
//! first-party consumers: permission checks before access, the organization
//! scope guard on resource loads, and the audit gate on mutations.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::domain::error::Error;
use crate::domain::model::OrganizationId;
use crate::infrastructure::auth::scope::OrganizationScopeGuard;

use super::middleware::{ensure_any_role, ensure_permission, PrincipalExtractor};
use super::models::ApiResponse;
use super::AppState;

/// Patient demographics record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: i64,
    pub name: String,
    pub organization_id: OrganizationId,
}

/// Visit entry recorded against a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub patient_id: i64,
    pub recorded_by: i64,
    pub notes: String,
}

/// In-memory patient index standing in for the records store
#[derive(Default)]
pub struct PatientDirectory {
    patients: DashMap<i64, PatientRecord>,
    visits: DashMap<i64, VisitRecord>,
}

impl PatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: PatientRecord) {
        self.patients.insert(record.id, record);
    }

    pub fn get(&self, id: i64) -> Option<PatientRecord> {
        self.patients.get(&id).map(|entry| entry.value().clone())
    }

    pub fn for_organization(&self, organization_id: Option<OrganizationId>) -> Vec<PatientRecord> {
        self.patients
            .iter()
            .filter(|entry| match organization_id {
                Some(org) => entry.value().organization_id == org,
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn next_id(&self) -> i64 {
        self.patients
            .iter()
            .map(|entry| entry.value().id)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn add_visit(&self, visit: VisitRecord) {
        self.visits.insert(visit.id, visit);
    }

    pub fn next_visit_id(&self) -> i64 {
        self.visits
            .iter()
            .map(|entry| entry.value().id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Patient creation request body
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    /// Defaults to the caller's effective organization
    pub organization_id: Option<OrganizationId>,
}

/// List patients visible in the caller's tenant
pub async fn list_patients(
    State(state): State<AppState>,
    principal: PrincipalExtractor,
) -> axum::response::Response {
    if let Err(err) = ensure_permission(&state.rbac, &principal, "viewPatients").await {
        return err.into_response();
    }

    let patients = state
        .patients
        .for_organization(principal.effective_organization());
    Json(ApiResponse::success(patients)).into_response()
}

/// Load one patient, enforcing the tenant boundary on the loaded resource
pub async fn get_patient(
    State(state): State<AppState>,
    principal: PrincipalExtractor,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(err) = ensure_permission(&state.rbac, &principal, "viewPatients").await {
        return err.into_response();
    }

    let Some(patient) = state.patients.get(id) else {
        return Error::not_found(format!("patient {}", id)).into_response();
    };

    if let Err(err) = OrganizationScopeGuard::check(&principal, patient.organization_id) {
        return err.into_response();
    }

    Json(ApiResponse::success(patient)).into_response()
}

/// Create a patient record; the mutation passes the audit gate on the way out
pub async fn create_patient(
    State(state): State<AppState>,
    principal: PrincipalExtractor,
    Json(req): Json<CreatePatientRequest>,
) -> axum::response::Response {
    if let Err(err) = ensure_permission(&state.rbac, &principal, "editPatients").await {
        return err.into_response();
    }

    let Some(organization_id) = req
        .organization_id
        .or_else(|| principal.effective_organization())
    else {
        return Error::invalid_argument("organization_id is required").into_response();
    };

    if let Err(err) = OrganizationScopeGuard::check(&principal, organization_id) {
        return err.into_response();
    }

    let record = PatientRecord {
        id: state.patients.next_id(),
        name: req.name,
        organization_id,
    };
    state.patients.insert(record.clone());

    // suppression never blocks the action; it only skips the audit row
    if let Err(err) = state.audit.record(&principal, "create", "patient").await {
        return err.into_response();
    }

    Json(ApiResponse::success(record)).into_response()
}

/// Visit creation request body
#[derive(Debug, Clone, Deserialize)]
pub struct RecordVisitRequest {
    pub patient_id: i64,
    #[serde(default)]
    pub notes: String,
}

/// Record a visit against a patient
///
/// Gated by role rather than permission: clinical staff are identified by
/// their role name here, which keeps legacy accounts working while the
/// audit gate surfaces any missing role assignment on the way out.
pub async fn record_visit(
    State(state): State<AppState>,
    principal: PrincipalExtractor,
    Json(req): Json<RecordVisitRequest>,
) -> axum::response::Response {
    if let Err(err) = ensure_any_role(&state.rbac, &principal, &["doctor", "nurse"]) {
        return err.into_response();
    }

    let Some(patient) = state.patients.get(req.patient_id) else {
        return Error::not_found(format!("patient {}", req.patient_id)).into_response();
    };

    if let Err(err) = OrganizationScopeGuard::check(&principal, patient.organization_id) {
        return err.into_response();
    }

    let visit = VisitRecord {
        id: state.patients.next_visit_id(),
        patient_id: patient.id,
        recorded_by: principal.id,
        notes: req.notes,
    };
    state.patients.add_visit(visit.clone());

    if let Err(err) = state.audit.record(&principal, "create", "visit").await {
        return err.into_response();
    }

    Json(ApiResponse::success(visit)).into_response()
}

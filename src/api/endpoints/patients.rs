//! Patient endpoints.
//!
//! - `GET /api/patients`: dashboard listing, diagnosis masked
//! - `POST /api/patients`: create (validate, sanitize, encrypt)
//! - `GET /api/patients/:id`: full record, diagnosis decrypted
//! - `DELETE /api/patients/:id`: delete with its appointments

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StaffContext};
use crate::models::{PatientDetail, PatientSummary};
use crate::records;
use crate::validation::{validate_patient, NewPatientForm};

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<PatientSummary>,
}

fn parse_patient_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid patient ID format".into()))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patients = records::patient_dashboard(&conn)?;
    Ok(Json(PatientsResponse { patients }))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<StaffContext>,
    Json(form): Json<NewPatientForm>,
) -> Result<(StatusCode, Json<PatientDetail>), ApiError> {
    let valid = validate_patient(&form)?;
    let conn = ctx.core.open_db()?;
    let patient = records::create_patient(&conn, ctx.core.field_key(), &valid)?;
    tracing::debug!(staff_id = %caller.staff.staff_id, patient_id = %patient.id, "Patient registered");
    Ok((
        StatusCode::CREATED,
        Json(PatientDetail::from_stored(patient, valid.diagnosis)),
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientDetail>, ApiError> {
    let id = parse_patient_id(&patient_id)?;
    let conn = ctx.core.open_db()?;
    let patient = records::patient_detail(&conn, ctx.core.field_key(), &id)?;
    Ok(Json(patient))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
    Path(patient_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_patient_id(&patient_id)?;
    let conn = ctx.core.open_db()?;
    records::delete_patient(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

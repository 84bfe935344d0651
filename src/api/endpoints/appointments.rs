//! Appointment endpoints.
//!
//! - `GET /api/appointments`: all appointments, latest date first
//! - `POST /api/appointments`: book one for an existing patient

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StaffContext};
use crate::models::Appointment;
use crate::records;
use crate::validation::{validate_appointment, NewAppointmentForm};

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let appointments = records::list_appointments(&conn)?;
    Ok(Json(AppointmentsResponse { appointments }))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
    Json(form): Json<NewAppointmentForm>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let valid = validate_appointment(&form)?;
    let conn = ctx.core.open_db()?;
    let appointment = records::book_appointment(&conn, &valid)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

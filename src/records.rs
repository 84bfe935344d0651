//! Patient and appointment record operations.
//!
//! Sits between the HTTP handlers and the repository: takes validated
//! forms, encrypts the diagnosis on the way in, decrypts it on the way
//! out for the detail view, and masks it for the dashboard.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::{decrypt_field, encrypt_field, CryptoError, FieldKey};
use crate::db::{self, DatabaseError};
use crate::models::{Appointment, Patient, PatientDetail, PatientSummary};
use crate::validation::{ValidAppointment, ValidPatient};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Store a new patient with the diagnosis encrypted under `key`.
pub fn create_patient(
    conn: &Connection,
    key: &FieldKey,
    form: &ValidPatient,
) -> Result<Patient, RecordError> {
    let patient = Patient {
        id: Uuid::new_v4(),
        name: form.name.clone(),
        age: form.age,
        gender: form.gender,
        contact: form.contact.clone(),
        diagnosis_encrypted: encrypt_field(key, &form.diagnosis)?,
        created_at: Utc::now(),
    };
    db::insert_patient(conn, &patient)?;
    tracing::info!(patient_id = %patient.id, "Patient created");
    Ok(patient)
}

/// Dashboard listing: every patient, diagnosis masked.
pub fn patient_dashboard(conn: &Connection) -> Result<Vec<PatientSummary>, RecordError> {
    let patients = db::list_patients(conn)?;
    Ok(patients
        .into_iter()
        .map(|(patient, count)| PatientSummary::from_stored(patient, count))
        .collect())
}

/// One patient with the diagnosis decrypted.
pub fn patient_detail(
    conn: &Connection,
    key: &FieldKey,
    id: &Uuid,
) -> Result<PatientDetail, RecordError> {
    let patient = db::get_patient(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.to_string(),
    })?;
    let diagnosis = decrypt_field(key, &patient.diagnosis_encrypted)?;
    Ok(PatientDetail::from_stored(patient, diagnosis))
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), RecordError> {
    db::delete_patient(conn, id)?;
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(())
}

pub fn book_appointment(
    conn: &Connection,
    form: &ValidAppointment,
) -> Result<Appointment, RecordError> {
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: form.patient_id,
        date: form.date,
        reason: form.reason.clone(),
        created_at: Utc::now(),
    };
    db::insert_appointment(conn, &appointment)?;
    tracing::info!(appointment_id = %appointment.id, date = %appointment.date, "Appointment booked");
    Ok(appointment)
}

pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, RecordError> {
    Ok(db::list_appointments(conn)?)
}

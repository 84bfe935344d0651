use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, age, gender, contact, diagnosis_encrypted, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender.as_str(),
            patient.contact,
            patient.diagnosis_encrypted,
            patient.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, age, gender, contact, diagnosis_encrypted, created_at
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            read_patient_row,
        )
        .optional()?;

    row.map(patient_from_row).transpose()
}

/// All patients, newest first, each with its appointment total.
pub fn list_patients(conn: &Connection) -> Result<Vec<(Patient, u32)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.age, p.gender, p.contact, p.diagnosis_encrypted, p.created_at,
                (SELECT COUNT(*) FROM appointments a WHERE a.patient_id = p.id) AS appointment_count
         FROM patients p
         ORDER BY p.created_at DESC, p.name ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let patient = read_patient_row(row)?;
        let count: u32 = row.get("appointment_count")?;
        Ok((patient, count))
    })?;

    let mut patients = Vec::new();
    for row in rows {
        let (raw, count) = row?;
        patients.push((patient_from_row(raw)?, count));
    }
    Ok(patients)
}

pub fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Hard-deletes a patient; their appointments go with them (ON DELETE CASCADE).
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM patients WHERE id = ?1",
        params![id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type PatientRow = (String, String, u8, String, String, String, String);

fn read_patient_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    let (id, name, age, gender, contact, diagnosis_encrypted, created_at) = row;
    Ok(Patient {
        id: parse_uuid(&id)?,
        name,
        age,
        gender: Gender::from_str(&gender)?,
        contact,
        diagnosis_encrypted,
        created_at: parse_timestamp(&created_at)?,
    })
}

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Appointment;

/// Dates are stored as `YYYY-MM-DD` so equality and range scans work on text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    if !super::patient_exists(conn, &appt.patient_id)? {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: appt.patient_id.to_string(),
        });
    }

    conn.execute(
        "INSERT INTO appointments (id, patient_id, date, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.date.format(DATE_FORMAT).to_string(),
            appt.reason,
            appt.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// All appointments, most recent date first.
pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, date, reason, created_at
         FROM appointments
         ORDER BY date DESC, created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut appointments = Vec::new();
    for row in rows {
        let (id, patient_id, date, reason, created_at) = row?;
        appointments.push(Appointment {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {date}: {e}")))?,
            reason,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(appointments)
}

/// Raw per-date appointment counts for `start..=end`.
///
/// Only dates with at least one appointment are returned. The date column
/// is handed back verbatim; callers decide what a malformed value means.
pub fn count_appointments_by_date(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(String, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT date, COUNT(*) FROM appointments
         WHERE date >= ?1 AND date <= ?2
         GROUP BY date
         ORDER BY date",
    )?;

    let rows = stmt.query_map(
        params![
            start.format(DATE_FORMAT).to_string(),
            end.format(DATE_FORMAT).to_string()
        ],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
    )?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)
}

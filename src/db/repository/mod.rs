//! Repository layer: entity-scoped database operations.
//!
//! All public functions are re-exported here so callers can use
//! `crate::db::insert_patient` without naming the sub-module.

mod appointment;
mod patient;
mod staff;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use patient::*;
pub use staff::*;

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {value}: {e}")))
}

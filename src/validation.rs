//! Patient and appointment form validation.
//!
//! Forms arrive as loosely-typed JSON; validation produces the typed,
//! sanitized values the repository stores. Each error names its field.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::DATE_FORMAT;
use crate::models::Gender;
use crate::sanitize::{clean_text, sanitize_text, MAX_LONG_FIELD, MAX_SHORT_FIELD};

pub const MAX_AGE: i64 = 150;
pub const MAX_REASON: usize = 500;
const MIN_CONTACT_DIGITS: usize = 7;
const MAX_CONTACT_DIGITS: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("age must be between 0 and 150")]
    AgeOutOfRange,

    #[error("gender must be one of male, female, other")]
    InvalidGender,

    #[error("contact must be a phone number of 7 to 15 digits")]
    InvalidContact,

    #[error("{field} is not a valid identifier")]
    InvalidId { field: &'static str },

    #[error("date must be formatted YYYY-MM-DD")]
    InvalidDate,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field } | Self::TooLong { field, .. } | Self::InvalidId { field } => field,
            Self::AgeOutOfRange => "age",
            Self::InvalidGender => "gender",
            Self::InvalidContact => "contact",
            Self::InvalidDate => "date",
        }
    }
}

/// Patient creation form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatientForm {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub contact: String,
    pub diagnosis: String,
}

/// A patient form that passed validation. Text fields are sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPatient {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub contact: String,
    pub diagnosis: String,
}

/// Appointment booking form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointmentForm {
    pub patient_id: String,
    pub date: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAppointment {
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

pub fn validate_patient(form: &NewPatientForm) -> Result<ValidPatient, ValidationError> {
    let name = required_text("name", &form.name, MAX_SHORT_FIELD)?;

    if !(0..=MAX_AGE).contains(&form.age) {
        return Err(ValidationError::AgeOutOfRange);
    }

    let gender = Gender::from_str(form.gender.trim().to_lowercase().as_str())
        .map_err(|_| ValidationError::InvalidGender)?;

    let contact = validate_contact(&form.contact)?;
    let diagnosis = required_text("diagnosis", &form.diagnosis, MAX_LONG_FIELD)?;

    Ok(ValidPatient {
        name,
        age: form.age as u8,
        gender,
        contact,
        diagnosis,
    })
}

pub fn validate_appointment(form: &NewAppointmentForm) -> Result<ValidAppointment, ValidationError> {
    let patient_id = Uuid::parse_str(form.patient_id.trim())
        .map_err(|_| ValidationError::InvalidId { field: "patient_id" })?;

    let date = NaiveDate::parse_from_str(form.date.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate)?;

    let reason = match form.reason.as_deref() {
        None => None,
        Some(raw) => bounded_text("reason", raw, MAX_REASON)?,
    };

    Ok(ValidAppointment { patient_id, date, reason })
}

fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String, ValidationError> {
    bounded_text(field, raw, max)?.ok_or(ValidationError::Required { field })
}

/// Reject over-long input instead of silently truncating it, then escape.
/// `max` counts the characters the user typed; the escaped form may be
/// longer and is stored whole. Blank input is `None`.
fn bounded_text(
    field: &'static str,
    raw: &str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let plain = clean_text(raw);
    if plain.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    if plain.is_empty() {
        return Ok(None);
    }
    Ok(Some(sanitize_text(&plain)))
}

fn validate_contact(raw: &str) -> Result<String, ValidationError> {
    static PHONE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]*$").expect("static phone pattern"));

    let contact = raw.trim();
    if contact.is_empty() {
        return Err(ValidationError::Required { field: "contact" });
    }
    if !PHONE.is_match(contact) {
        return Err(ValidationError::InvalidContact);
    }
    let digits = contact.chars().filter(char::is_ascii_digit).count();
    if !(MIN_CONTACT_DIGITS..=MAX_CONTACT_DIGITS).contains(&digits) {
        return Err(ValidationError::InvalidContact);
    }
    Ok(contact.to_string())
}

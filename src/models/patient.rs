use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Gender;

/// A patient row as stored. The diagnosis is only ever held as
/// base64 `nonce || ciphertext`; decryption happens in the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub contact: String,
    pub diagnosis_encrypted: String,
    pub created_at: DateTime<Utc>,
}

/// Dashboard row: diagnosis masked, appointment total attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub contact: String,
    pub diagnosis: String,
    pub appointment_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Full patient record with the diagnosis decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetail {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub contact: String,
    pub diagnosis: String,
    pub created_at: DateTime<Utc>,
}

/// What the dashboard shows in place of a diagnosis.
pub const DIAGNOSIS_MASK: &str = "********";

/// Mask a stored diagnosis for listing. The mask has a fixed width so it
/// says nothing about the length of the underlying text.
pub fn mask_diagnosis(stored: &str) -> String {
    if stored.is_empty() {
        String::new()
    } else {
        DIAGNOSIS_MASK.to_string()
    }
}

impl PatientSummary {
    pub fn from_stored(patient: Patient, appointment_count: u32) -> Self {
        Self {
            diagnosis: mask_diagnosis(&patient.diagnosis_encrypted),
            id: patient.id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            contact: patient.contact,
            appointment_count,
            created_at: patient.created_at,
        }
    }
}

impl PatientDetail {
    pub fn from_stored(patient: Patient, diagnosis: String) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            contact: patient.contact,
            diagnosis,
            created_at: patient.created_at,
        }
    }
}

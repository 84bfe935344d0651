use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A clinic staff account. Never serialized: it carries the password hash.
#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

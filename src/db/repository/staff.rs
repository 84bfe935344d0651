use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::StaffAccount;

pub fn insert_staff(conn: &Connection, staff: &StaffAccount) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO staff (id, username, password_hash, password_salt, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            staff.id.to_string(),
            staff.username,
            staff.password_hash,
            staff.password_salt,
            staff.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn find_staff_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<StaffAccount>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, username, password_hash, password_salt, created_at
             FROM staff WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, username, password_hash, password_salt, created_at)) => Ok(Some(StaffAccount {
            id: parse_uuid(&id)?,
            username,
            password_hash,
            password_salt,
            created_at: parse_timestamp(&created_at)?,
        })),
        None => Ok(None),
    }
}

pub fn count_staff(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM staff", [], |row| row.get(0))?;
    Ok(count)
}

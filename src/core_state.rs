//! Shared application state.
//!
//! `CoreState` is built once at startup and shared behind an `Arc` by
//! every request handler. Connections are opened per request; the only
//! mutable state held here is the session table.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::crypto::{hash_password, verify_password, CryptoError, FieldKey};
use crate::db::{self, DatabaseError};
use crate::models::StaffAccount;
use crate::session::{AuthenticatedStaff, SessionStore};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    db_path: PathBuf,
    /// Key for the encrypted diagnosis column. Zeroed on drop.
    field_key: FieldKey,
    sessions: Mutex<SessionStore>,
    /// How long an analytics query may wait on a locked database.
    analytics_timeout: Duration,
}

impl CoreState {
    pub fn new(
        db_path: PathBuf,
        field_key: FieldKey,
        session_idle: Duration,
        analytics_timeout: Duration,
    ) -> Self {
        Self {
            db_path,
            field_key,
            sessions: Mutex::new(SessionStore::new(session_idle)),
            analytics_timeout,
        }
    }

    /// Derive the field key and resolve paths from the parsed configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, CoreError> {
        let field_key = FieldKey::derive(&config.field_secret)?;
        Ok(Self::new(
            config.database_path(),
            field_key,
            Duration::from_secs(config.session_idle_secs),
            Duration::from_millis(config.analytics_timeout_ms),
        ))
    }

    // ── Database access ─────────────────────────────────────

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection for a request. Runs pending migrations.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    /// Open a connection for analytics reads: a locked database fails
    /// after the configured timeout instead of blocking the request.
    pub fn open_analytics_db(&self) -> Result<Connection, CoreError> {
        db::open_database_with_timeout(&self.db_path, self.analytics_timeout)
            .map_err(CoreError::Database)
    }

    pub fn analytics_timeout(&self) -> Duration {
        self.analytics_timeout
    }

    pub fn field_key(&self) -> &FieldKey {
        &self.field_key
    }

    // ── Staff accounts ──────────────────────────────────────

    /// Create the first staff account if none exists yet.
    /// Returns whether an account was created.
    pub fn bootstrap_admin(&self, username: &str, password: &str) -> Result<bool, CoreError> {
        let conn = self.open_db()?;
        if db::count_staff(&conn)? > 0 {
            return Ok(false);
        }
        create_staff(&conn, username, password)?;
        tracing::info!(username, "Bootstrap staff account created");
        Ok(true)
    }

    // ── Sessions ────────────────────────────────────────────

    fn lock_sessions(&self) -> Result<MutexGuard<'_, SessionStore>, CoreError> {
        self.sessions.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Check credentials and open a session. Returns the bearer token.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to
    /// the caller.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, AuthenticatedStaff), CoreError> {
        let conn = self.open_db()?;
        let account = db::find_staff_by_username(&conn, username)?;

        let staff = match account {
            Some(acc) if verify_password(password, &acc.password_hash, &acc.password_salt) => {
                AuthenticatedStaff {
                    staff_id: acc.id,
                    username: acc.username,
                }
            }
            _ => {
                tracing::warn!("Login rejected");
                return Err(CoreError::InvalidCredentials);
            }
        };

        let token = self.lock_sessions()?.create(staff.clone());
        tracing::info!(staff_id = %staff.staff_id, "Staff logged in");
        Ok((token, staff))
    }

    /// Resolve a bearer token, refreshing its idle clock.
    pub fn authenticate(&self, token: &str) -> Result<Option<AuthenticatedStaff>, CoreError> {
        Ok(self.lock_sessions()?.authenticate(token))
    }

    /// End the session for `token`. Returns whether it was active.
    pub fn logout(&self, token: &str) -> Result<bool, CoreError> {
        Ok(self.lock_sessions()?.revoke(token))
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Hash `password` and store a new staff account.
pub fn create_staff(conn: &Connection, username: &str, password: &str) -> Result<StaffAccount, CoreError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(CoreError::InvalidCredentials);
    }
    let (password_hash, password_salt) = hash_password(password);
    let account = StaffAccount {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash,
        password_salt,
        created_at: Utc::now(),
    };
    db::insert_staff(conn, &account)?;
    Ok(account)
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

#[cfg(test)]
pub(crate) fn test_state(dir: &Path) -> CoreState {
    CoreState::new(
        dir.join("clinic.db"),
        crate::crypto::keys::test_key("test-secret"),
        Duration::from_secs(60),
        Duration::from_millis(200),
    )
}

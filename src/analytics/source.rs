use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

use crate::db::{count_appointments_by_date, DatabaseError, DATE_FORMAT};

/// Why a count lookup could not be answered. Every variant sends the
/// engine down its fallback path.
#[derive(Debug, Error)]
pub enum CountSourceError {
    #[error("count query failed: {0}")]
    Database(DatabaseError),

    #[error("count query timed out")]
    Timeout,

    #[error("malformed count data: {0}")]
    Malformed(String),

    #[error("count source unavailable: {0}")]
    Unavailable(String),
}

impl From<DatabaseError> for CountSourceError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                CountSourceError::Timeout
            }
            _ => CountSourceError::Database(err),
        }
    }
}

/// Answers "how many appointments fall on each date in `start..=end`".
///
/// Implementations may omit dates without appointments; the engine
/// zero-fills. Dates outside the range are ignored if returned.
pub trait CountSource {
    fn counts_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u64>, CountSourceError>;
}

/// Fixed in-memory counts.
impl CountSource for BTreeMap<NaiveDate, u64> {
    fn counts_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u64>, CountSourceError> {
        Ok(self.range(start..=end).map(|(d, c)| (*d, *c)).collect())
    }
}

/// Adapts a single-date lookup (`count on date D`) to the range form by
/// asking once per date.
pub struct DailyCounts<F>(pub F);

impl<F> CountSource for DailyCounts<F>
where
    F: Fn(NaiveDate) -> Result<u64, CountSourceError>,
{
    fn counts_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u64>, CountSourceError> {
        let mut counts = BTreeMap::new();
        let dates = (0..)
            .map_while(|offset| start.checked_add_days(Days::new(offset)))
            .take_while(|d| *d <= end);
        for date in dates {
            let count = (self.0)(date)?;
            if count > 0 {
                counts.insert(date, count);
            }
        }
        Ok(counts)
    }
}

/// Stands in when the store could not be reached at all (database file
/// missing, unreadable, permission denied). Every lookup fails, so the
/// engine serves its fallback series.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    pub reason: String,
}

impl CountSource for UnavailableSource {
    fn counts_between(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u64>, CountSourceError> {
        Err(CountSourceError::Unavailable(self.reason.clone()))
    }
}

/// Counts from the `appointments` table with a single grouped query.
///
/// Open the connection with a busy timeout
/// (`db::open_database_with_timeout`) so a locked database surfaces as
/// [`CountSourceError::Timeout`] instead of blocking the request.
pub struct SqliteCountSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCountSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl CountSource for SqliteCountSource<'_> {
    fn counts_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u64>, CountSourceError> {
        let rows = count_appointments_by_date(self.conn, start, end)?;

        let mut counts = BTreeMap::new();
        for (raw_date, raw_count) in rows {
            let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
                .map_err(|_| CountSourceError::Malformed(format!("date {raw_date:?}")))?;
            let count = u64::try_from(raw_count)
                .map_err(|_| CountSourceError::Malformed(format!("count {raw_count} on {raw_date}")))?;
            counts.insert(date, count);
        }
        Ok(counts)
    }
}

//! SQLite storage for herd health records.

mod schema;
mod query;
mod records;
mod vaccinations;
mod treatments;
mod diseases;
mod alerts;
mod store;

pub use schema::*;
pub use store::SqliteHealthStore;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::repository::StorageError;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DbError::Poisoned(e.to_string())
    }
}

impl From<DbError> for StorageError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(_) | DbError::Poisoned(_) => StorageError::Backend(e.to_string()),
            DbError::Json(_) | DbError::Timestamp(_) | DbError::Constraint(_) => {
                StorageError::Corrupt(e.to_string())
            }
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// How long a writer waits for another connection's IMMEDIATE transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A SQLite connection with the herd health schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store at `path`, creating the file and tables if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::with_schema(Connection::open(path)?)
    }

    /// Private store that disappears with the handle.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> DbResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Render a timestamp for storage.
///
/// Fixed-width nanosecond RFC 3339 in UTC, so string comparison in SQL is
/// chronological comparison and a stored value reads back unchanged.
pub(crate) fn to_db_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn from_db_time(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Timestamp(format!("{}: {}", s, e)))
}

pub(crate) fn from_db_time_opt(s: Option<String>) -> DbResult<Option<DateTime<Utc>>> {
    s.as_deref().map(from_db_time).transpose()
}

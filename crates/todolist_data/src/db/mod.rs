//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the to-do data layer.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No entity row is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_migrated, open_db_with, ContextOptions};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure shared by the context, transactions and flushes.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The context (and its connection) was already disposed.
    Disposed,
    /// The connection is already inside a transaction.
    TransactionAlreadyActive,
    /// Commit or rollback on a transaction that already finished.
    TransactionFinished,
    /// A staged update/delete matched no row when flushed.
    ConcurrencyConflict { entity: &'static str, id: Uuid },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Disposed => write!(f, "database context has been disposed"),
            Self::TransactionAlreadyActive => {
                write!(f, "connection is already inside a transaction")
            }
            Self::TransactionFinished => {
                write!(f, "transaction has already been committed or rolled back")
            }
            Self::ConcurrencyConflict { entity, id } => write!(
                f,
                "{entity} {id} was expected to exist but no row was affected"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

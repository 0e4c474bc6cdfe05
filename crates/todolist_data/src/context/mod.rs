//! Database context and transaction abstractions.
//!
//! # Responsibility
//! - Describe the handle a unit of work owns (`DbContext`) and the
//!   transaction it opens (`DbTransaction`).
//! - Stage entity writes in a change tracker until `save_changes`.
//!
//! # Invariants
//! - A context is disposed at most once; every call after that fails with
//!   `DbError::Disposed`.
//! - A transaction is finished by exactly one successful commit or rollback.

mod change_tracker;
mod todo_list_context;

pub use change_tracker::{ChangeTracker, EntityEntry, EntityState, TrackedEntity};
pub use todo_list_context::{SqliteTransaction, ToDoListDbContext, TransactionState};

use crate::db::{DbError, DbResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Transaction isolation policy requested when a transaction begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Dirty reads allowed. Default policy of the unit of work.
    #[default]
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    /// Takes the write lock up front (`BEGIN IMMEDIATE`).
    Serializable,
}

impl IsolationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "read_uncommitted",
            Self::ReadCommitted => "read_committed",
            Self::RepeatableRead => "repeatable_read",
            Self::Serializable => "serializable",
        }
    }

    /// SQLite only honors this for shared-cache connections.
    pub fn allows_dirty_reads(self) -> bool {
        matches!(self, Self::ReadUncommitted)
    }

    pub(crate) fn begin_sql(self) -> &'static str {
        match self {
            Self::Serializable => "BEGIN IMMEDIATE;",
            _ => "BEGIN DEFERRED;",
        }
    }
}

/// Marker naming the concrete context type a repository was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextTag {
    name: &'static str,
    type_id: TypeId,
}

impl ContextTag {
    pub fn of<C: 'static>() -> Self {
        Self {
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<C: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }
}

/// Open transaction on a database context.
pub trait DbTransaction: Send {
    fn isolation_level(&self) -> IsolationLevel;
    fn commit(&mut self) -> DbResult<()>;
    fn rollback(&mut self) -> DbResult<()>;
    /// Releases the transaction, rolling back when it is still active.
    fn dispose(&mut self);
}

/// Session against the persistence store with in-memory change tracking.
pub trait DbContext: Send + Sync + 'static {
    type Transaction: DbTransaction;

    /// Flushes all staged changes and returns the number of affected rows.
    fn save_changes(&self) -> DbResult<usize>;

    fn begin_transaction(&self, isolation_level: IsolationLevel)
        -> DbResult<Self::Transaction>;

    /// Stages one entity change for the next `save_changes`.
    fn track(&self, entry: EntityEntry) -> DbResult<()>;

    fn pending_changes(&self) -> usize;

    /// Runs a read against the underlying connection.
    fn with_connection<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Connection) -> Result<T, E>;

    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! SQLite-backed database context for the to-do list schema.
//!
//! # Responsibility
//! - Own one migrated connection shared with the transactions it opens.
//! - Flush tracked changes atomically inside a savepoint.
//!
//! # Invariants
//! - The connection is closed exactly once, by `dispose`.
//! - A failed flush leaves the database untouched and the tracker intact.

use super::{
    lock_recover, ChangeTracker, DbContext, DbTransaction, EntityEntry, IsolationLevel,
};
use crate::db::{open_db_in_memory, open_db_with, ContextOptions, DbError, DbResult};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

type SharedConnection = Arc<Mutex<Option<Connection>>>;

const SAVE_CHANGES_SAVEPOINT: &str = "save_changes";

/// Database context for the users/categories/things-to-do schema.
pub struct ToDoListDbContext {
    conn: SharedConnection,
    tracker: Mutex<ChangeTracker>,
}

impl ToDoListDbContext {
    /// Opens (and migrates) a database file with default options.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open_with(path, ContextOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: ContextOptions) -> DbResult<Self> {
        Ok(Self::from_connection(open_db_with(path, options)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that has already been bootstrapped and migrated.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            tracker: Mutex::new(ChangeTracker::default()),
        }
    }

    fn flush(&self) -> DbResult<(usize, usize)> {
        let mut tracker = lock_recover(&self.tracker);
        let mut guard = lock_recover(&self.conn);
        let conn = guard.as_mut().ok_or(DbError::Disposed)?;
        if tracker.is_empty() {
            return Ok((0, 0));
        }

        // Dropping the savepoint without commit rolls back partial writes.
        let savepoint = conn.savepoint_with_name(SAVE_CHANGES_SAVEPOINT)?;
        let affected = tracker.apply(&savepoint)?;
        savepoint.commit()?;

        let entries = tracker.len();
        tracker.clear();
        Ok((entries, affected))
    }
}

impl DbContext for ToDoListDbContext {
    type Transaction = SqliteTransaction;

    fn save_changes(&self) -> DbResult<usize> {
        let started_at = Instant::now();
        match self.flush() {
            Ok((entries, affected)) => {
                debug!(
                    "event=context_save module=context status=ok entries={entries} affected={affected} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(affected)
            }
            Err(err) => {
                error!(
                    "event=context_save module=context status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    fn begin_transaction(&self, isolation_level: IsolationLevel) -> DbResult<SqliteTransaction> {
        SqliteTransaction::begin(Arc::clone(&self.conn), isolation_level)
    }

    fn track(&self, entry: EntityEntry) -> DbResult<()> {
        if self.is_disposed() {
            return Err(DbError::Disposed);
        }
        debug!(
            "event=context_track module=context status=ok entity={} state={} id={}",
            entry.entity.kind(),
            entry.state.as_str(),
            entry.entity.id()
        );
        lock_recover(&self.tracker).track(entry);
        Ok(())
    }

    fn pending_changes(&self) -> usize {
        lock_recover(&self.tracker).len()
    }

    fn with_connection<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let guard = lock_recover(&self.conn);
        let conn = guard.as_ref().ok_or_else(|| E::from(DbError::Disposed))?;
        f(conn)
    }

    fn dispose(&self) {
        lock_recover(&self.tracker).clear();
        let Some(conn) = lock_recover(&self.conn).take() else {
            return;
        };
        match conn.close() {
            Ok(()) => info!("event=context_dispose module=context status=ok"),
            Err((_, err)) => warn!(
                "event=context_dispose module=context status=error error_code=close_failed error={err}"
            ),
        }
    }

    fn is_disposed(&self) -> bool {
        lock_recover(&self.conn).is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
    Disposed,
}

/// Explicit `BEGIN ... COMMIT/ROLLBACK` span on the context connection.
pub struct SqliteTransaction {
    conn: SharedConnection,
    isolation_level: IsolationLevel,
    state: TransactionState,
}

impl SqliteTransaction {
    fn begin(conn: SharedConnection, isolation_level: IsolationLevel) -> DbResult<Self> {
        {
            let guard = lock_recover(&conn);
            let connection = guard.as_ref().ok_or(DbError::Disposed)?;
            if !connection.is_autocommit() {
                return Err(DbError::TransactionAlreadyActive);
            }
            connection.pragma_update(
                None,
                "read_uncommitted",
                isolation_level.allows_dirty_reads(),
            )?;
            connection.execute_batch(isolation_level.begin_sql())?;
        }

        debug!(
            "event=tx_begin module=context status=ok isolation={}",
            isolation_level.as_str()
        );
        Ok(Self {
            conn,
            isolation_level,
            state: TransactionState::Active,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn ensure_active(&self) -> DbResult<()> {
        if self.state == TransactionState::Active {
            Ok(())
        } else {
            Err(DbError::TransactionFinished)
        }
    }
}

impl DbTransaction for SqliteTransaction {
    fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    fn commit(&mut self) -> DbResult<()> {
        self.ensure_active()?;
        {
            let guard = lock_recover(&self.conn);
            let conn = guard.as_ref().ok_or(DbError::Disposed)?;
            // On failure (e.g. a deferred foreign key) SQLite keeps the
            // transaction open, so the state stays `Active`.
            conn.execute_batch("COMMIT;")?;
        }
        self.state = TransactionState::Committed;
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.ensure_active()?;
        {
            let guard = lock_recover(&self.conn);
            let conn = guard.as_ref().ok_or(DbError::Disposed)?;
            // SQLite may already have rolled back on its own after some errors.
            if !conn.is_autocommit() {
                conn.execute_batch("ROLLBACK;")?;
            }
        }
        self.state = TransactionState::RolledBack;
        Ok(())
    }

    fn dispose(&mut self) {
        if self.state == TransactionState::Active {
            match self.rollback() {
                Ok(()) | Err(DbError::Disposed) => {}
                Err(err) => warn!(
                    "event=tx_dispose module=context status=error error_code=rollback_failed error={err}"
                ),
            }
        }
        self.state = TransactionState::Disposed;
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteTransaction, ToDoListDbContext, TransactionState};
    use crate::context::{DbContext, DbTransaction, IsolationLevel};
    use crate::db::DbError;

    fn begin(context: &ToDoListDbContext) -> SqliteTransaction {
        context
            .begin_transaction(IsolationLevel::default())
            .expect("begin should succeed")
    }

    #[test]
    fn second_begin_on_same_connection_is_rejected() {
        let context = ToDoListDbContext::open_in_memory().expect("open in-memory context");
        let _first = begin(&context);

        let err = context
            .begin_transaction(IsolationLevel::ReadCommitted)
            .err()
            .expect("nested begin must fail");
        assert!(matches!(err, DbError::TransactionAlreadyActive));
    }

    #[test]
    fn commit_after_rollback_reports_finished() {
        let context = ToDoListDbContext::open_in_memory().expect("open in-memory context");
        let mut tx = begin(&context);
        tx.rollback().expect("rollback should succeed");

        assert!(matches!(tx.commit(), Err(DbError::TransactionFinished)));
        assert_eq!(tx.state(), TransactionState::RolledBack);
    }

    #[test]
    fn dropping_active_transaction_releases_connection() {
        let context = ToDoListDbContext::open_in_memory().expect("open in-memory context");
        drop(begin(&context));

        let autocommit = context
            .with_connection(|conn| Ok::<_, DbError>(conn.is_autocommit()))
            .expect("connection should be available");
        assert!(autocommit);
    }

    #[test]
    fn dispose_is_idempotent_and_blocks_further_use() {
        let context = ToDoListDbContext::open_in_memory().expect("open in-memory context");
        context.dispose();
        context.dispose();

        assert!(context.is_disposed());
        assert!(matches!(context.save_changes(), Err(DbError::Disposed)));
        assert!(matches!(
            context.begin_transaction(IsolationLevel::default()),
            Err(DbError::Disposed)
        ));
    }
}

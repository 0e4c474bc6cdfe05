//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas required by the data layer.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied, except from
//!   `open_db_migrated`, whose caller has already migrated the file.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection-level settings applied while opening a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Opens a SQLite database file with default options.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with(path, ContextOptions::default())
}

/// Opens a SQLite database file and applies all pending migrations.
pub fn open_db_with(path: impl AsRef<Path>, options: ContextOptions) -> DbResult<Connection> {
    let path = path.as_ref();
    open_and_bootstrap("file", options, Bootstrap::Migrate, || Connection::open(path))
}

/// Opens a database file whose schema is already current.
///
/// Applies connection pragmas only; the migration check is skipped.
pub fn open_db_migrated(
    path: impl AsRef<Path>,
    options: ContextOptions,
) -> DbResult<Connection> {
    let path = path.as_ref();
    open_and_bootstrap("file", options, Bootstrap::ConfigureOnly, || {
        Connection::open(path)
    })
}

/// Opens a private in-memory database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_and_bootstrap(
        "memory",
        ContextOptions::default(),
        Bootstrap::Migrate,
        Connection::open_in_memory,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bootstrap {
    Migrate,
    ConfigureOnly,
}

fn open_and_bootstrap(
    mode: &'static str,
    options: ContextOptions,
    bootstrap: Bootstrap,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = connect().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    if let Err(err) = bootstrap_connection(&mut conn, options, bootstrap) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} migrate={} duration_ms={}",
        bootstrap == Bootstrap::Migrate,
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(
    conn: &mut Connection,
    options: ContextOptions,
    bootstrap: Bootstrap,
) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
    if bootstrap == Bootstrap::Migrate {
        apply_migrations(conn)?;
    }
    Ok(())
}

//! Per-business-transaction unit of work creation.

use super::guard::try_catch;
use super::{DbUnitOfWork, UnitOfWork, UnitOfWorkOptions, UowResult};
use crate::context::ToDoListDbContext;
use crate::db::{open_db_migrated, ContextOptions};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;

/// Creates a fresh unit of work, with its own context, per call.
///
/// Commit and rollback dispose the context, so a unit of work is single-use.
pub trait UnitOfWorkFactory: Send + Sync {
    type UnitOfWork: UnitOfWork;

    fn create(&self) -> UowResult<Self::UnitOfWork>;
}

/// Opens a new `ToDoListDbContext` on a database file for every unit of work.
///
/// The first successful `create` migrates the file. Later calls, including
/// those on clones, only open and configure a connection.
#[derive(Debug, Clone)]
pub struct SqliteUnitOfWorkFactory {
    path: PathBuf,
    context_options: ContextOptions,
    options: UnitOfWorkOptions,
    migrated: Arc<OnceCell<()>>,
}

impl SqliteUnitOfWorkFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            context_options: ContextOptions::default(),
            options: UnitOfWorkOptions::default(),
            migrated: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_options(mut self, options: UnitOfWorkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_context_options(mut self, context_options: ContextOptions) -> Self {
        self.context_options = context_options;
        self
    }
}

impl UnitOfWorkFactory for SqliteUnitOfWorkFactory {
    type UnitOfWork = DbUnitOfWork<ToDoListDbContext>;

    fn create(&self) -> UowResult<Self::UnitOfWork> {
        let context = try_catch("open_context", || {
            if self.migrated.get().is_some() {
                let conn = open_db_migrated(&self.path, self.context_options)?;
                return Ok(ToDoListDbContext::from_connection(conn));
            }
            let context = ToDoListDbContext::open_with(&self.path, self.context_options)?;
            // A racing first call migrates too; migrations are idempotent.
            let _ = self.migrated.set(());
            Ok(context)
        })?;
        Ok(DbUnitOfWork::with_options(Arc::new(context), self.options))
    }
}

//! Unit of Work over one database context.
//!
//! # Responsibility
//! - Expose the four entity repositories, created lazily and at most once.
//! - Forward save/begin/commit/rollback to the context and its transaction.
//! - Own disposal of the transaction and the context.
//!
//! # Invariants
//! - At most one transaction is live per unit of work.
//! - Commit and rollback always dispose the transaction and the context,
//!   whatever their outcome.
//! - A failed commit/rollback issues exactly one compensating rollback
//!   before the original error is returned.

mod factory;
mod guard;
mod unit_of_work;

pub use factory::{SqliteUnitOfWorkFactory, UnitOfWorkFactory};
pub use unit_of_work::DbUnitOfWork;

use crate::context::IsolationLevel;
use crate::db::DbError;
use crate::repo::assignment_history_repo::TaskAssignmentHistoryRepository;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::thing_to_do_repo::ThingToDoRepository;
use crate::repo::user_repo::UserRepository;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MISSING_CONTEXT_MESSAGE: &str = "database context must be present";
pub const MISSING_TRANSACTION_MESSAGE: &str =
    "database transaction must be begun before it can be committed or rolled back";

pub type UowResult<T> = Result<T, UowError>;

#[derive(Debug)]
pub enum UowError {
    /// The context was never supplied or has already been disposed.
    MissingContext,
    /// Commit/rollback without a live transaction.
    MissingTransaction,
    TransactionAlreadyActive,
    /// Persistence call failed; `source` is the untouched driver error.
    Persistence {
        operation: &'static str,
        source: DbError,
    },
    /// The operation failed and so did its compensating rollback.
    CompensationFailed {
        operation: &'static str,
        original: DbError,
        compensation: DbError,
    },
}

impl UowError {
    /// Driver error that made the operation fail, if any.
    pub fn db_error(&self) -> Option<&DbError> {
        match self {
            Self::Persistence { source, .. } => Some(source),
            Self::CompensationFailed { original, .. } => Some(original),
            _ => None,
        }
    }
}

impl Display for UowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContext => f.write_str(MISSING_CONTEXT_MESSAGE),
            Self::MissingTransaction => f.write_str(MISSING_TRANSACTION_MESSAGE),
            Self::TransactionAlreadyActive => {
                write!(f, "a transaction is already active on this unit of work")
            }
            Self::Persistence { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::CompensationFailed {
                operation,
                original,
                compensation,
            } => write!(
                f,
                "{operation} failed: {original}; compensating rollback also failed: {compensation}"
            ),
        }
    }
}

impl Error for UowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence { source, .. } => Some(source),
            Self::CompensationFailed { original, .. } => Some(original),
            _ => None,
        }
    }
}

/// Policy applied to every transaction a unit of work begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitOfWorkOptions {
    pub isolation_level: IsolationLevel,
}

/// Capability surface consumed by application services.
pub trait UnitOfWork: Send + Sync {
    /// Flushes staged repository changes; returns affected rows.
    fn save_changes(&self) -> UowResult<usize>;
    fn begin_transaction(&self) -> UowResult<()>;
    fn commit_transaction(&self) -> UowResult<()>;
    fn rollback_transaction(&self) -> UowResult<()>;

    fn users(&self) -> &dyn UserRepository;
    fn categories(&self) -> &dyn CategoryRepository;
    fn things_to_do(&self) -> &dyn ThingToDoRepository;
    fn task_assignment_histories(&self) -> &dyn TaskAssignmentHistoryRepository;

    fn has_active_transaction(&self) -> bool;
    fn is_disposed(&self) -> bool;
    /// Idempotent. Disposes a live transaction, then the context.
    fn dispose(&self);
}

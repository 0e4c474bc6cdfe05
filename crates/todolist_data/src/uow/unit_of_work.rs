//! Concrete unit of work generic over its database context.

use super::guard::{try_catch, try_catch_compensate};
use super::{UnitOfWork, UnitOfWorkOptions, UowError, UowResult};
use crate::context::{lock_recover, ContextTag, DbContext, DbTransaction};
use crate::db::DbResult;
use crate::repo::assignment_history_repo::{
    SqliteTaskAssignmentHistoryRepository, TaskAssignmentHistoryRepository,
};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::thing_to_do_repo::{SqliteThingToDoRepository, ThingToDoRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::SqliteRepository;
use log::{debug, info};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard};

struct UowState<T> {
    transaction: Option<T>,
    disposed: bool,
}

/// Unit of work owning one context `C` and at most one of its transactions.
///
/// Each repository sits behind its own once-guard, so first access to two
/// different repositories never serializes on a shared lock.
pub struct DbUnitOfWork<C: DbContext> {
    context: Arc<C>,
    options: UnitOfWorkOptions,
    state: Mutex<UowState<C::Transaction>>,
    users: OnceCell<SqliteUserRepository<C>>,
    categories: OnceCell<SqliteCategoryRepository<C>>,
    things_to_do: OnceCell<SqliteThingToDoRepository<C>>,
    task_assignment_histories: OnceCell<SqliteTaskAssignmentHistoryRepository<C>>,
}

impl<C: DbContext> DbUnitOfWork<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self::with_options(context, UnitOfWorkOptions::default())
    }

    pub fn with_options(context: Arc<C>, options: UnitOfWorkOptions) -> Self {
        debug!(
            "event=uow_init module=uow status=ok context={} isolation={}",
            ContextTag::of::<C>().name(),
            options.isolation_level.as_str()
        );
        Self {
            context,
            options,
            state: Mutex::new(UowState {
                transaction: None,
                disposed: false,
            }),
            users: OnceCell::new(),
            categories: OnceCell::new(),
            things_to_do: OnceCell::new(),
            task_assignment_histories: OnceCell::new(),
        }
    }

    /// Fails with `MissingContext` when no context is supplied.
    pub fn try_new(context: Option<Arc<C>>) -> UowResult<Self> {
        Self::try_with_options(context, UnitOfWorkOptions::default())
    }

    pub fn try_with_options(
        context: Option<Arc<C>>,
        options: UnitOfWorkOptions,
    ) -> UowResult<Self> {
        let context = context.ok_or(UowError::MissingContext)?;
        Ok(Self::with_options(context, options))
    }

    pub fn options(&self) -> UnitOfWorkOptions {
        self.options
    }

    fn lock_state(&self) -> MutexGuard<'_, UowState<C::Transaction>> {
        lock_recover(&self.state)
    }

    fn repository<E>(&self) -> SqliteRepository<C, E>
    where
        E: crate::repo::entity::Entity,
    {
        SqliteRepository::new(Arc::clone(&self.context), ContextTag::of::<C>())
    }

    /// Shared body of commit and rollback.
    fn finish_transaction(
        &self,
        operation: &'static str,
        action: impl FnOnce(&mut C::Transaction) -> DbResult<()>,
        compensate: impl FnOnce(&mut C::Transaction) -> DbResult<()>,
    ) -> UowResult<()> {
        let mut state = self.lock_state();
        let transaction = state
            .transaction
            .take()
            .ok_or(UowError::MissingTransaction)?;

        let mut scope = TransactionScope {
            state,
            context: self.context.as_ref(),
            transaction,
        };
        let outcome = try_catch_compensate(operation, &mut scope.transaction, action, compensate);
        drop(scope);

        if outcome.is_ok() {
            info!("event=uow_{operation} module=uow status=ok");
        }
        outcome
    }
}

/// Releases the transaction and the context when commit/rollback leaves,
/// on every exit path.
struct TransactionScope<'a, C: DbContext> {
    state: MutexGuard<'a, UowState<C::Transaction>>,
    context: &'a C,
    transaction: C::Transaction,
}

impl<C: DbContext> Drop for TransactionScope<'_, C> {
    fn drop(&mut self) {
        self.transaction.dispose();
        if !self.state.disposed {
            self.context.dispose();
            self.state.disposed = true;
        }
    }
}

impl<C: DbContext> UnitOfWork for DbUnitOfWork<C> {
    fn save_changes(&self) -> UowResult<usize> {
        if self.lock_state().disposed {
            return Err(UowError::MissingContext);
        }
        try_catch("save_changes", || self.context.save_changes())
    }

    fn begin_transaction(&self) -> UowResult<()> {
        let mut state = self.lock_state();
        if state.disposed {
            return Err(UowError::MissingContext);
        }
        if state.transaction.is_some() {
            return Err(UowError::TransactionAlreadyActive);
        }

        let isolation_level = self.options.isolation_level;
        let transaction = try_catch("begin_transaction", || {
            self.context.begin_transaction(isolation_level)
        })?;
        state.transaction = Some(transaction);

        info!(
            "event=uow_begin_transaction module=uow status=ok isolation={}",
            isolation_level.as_str()
        );
        Ok(())
    }

    fn commit_transaction(&self) -> UowResult<()> {
        self.finish_transaction(
            "commit_transaction",
            |transaction| transaction.commit(),
            |transaction| transaction.rollback(),
        )
    }

    fn rollback_transaction(&self) -> UowResult<()> {
        self.finish_transaction(
            "rollback_transaction",
            |transaction| transaction.rollback(),
            |transaction| transaction.rollback(),
        )
    }

    fn users(&self) -> &dyn UserRepository {
        self.users.get_or_init(|| self.repository())
    }

    fn categories(&self) -> &dyn CategoryRepository {
        self.categories.get_or_init(|| self.repository())
    }

    fn things_to_do(&self) -> &dyn ThingToDoRepository {
        self.things_to_do.get_or_init(|| self.repository())
    }

    fn task_assignment_histories(&self) -> &dyn TaskAssignmentHistoryRepository {
        self.task_assignment_histories
            .get_or_init(|| self.repository())
    }

    fn has_active_transaction(&self) -> bool {
        self.lock_state().transaction.is_some()
    }

    fn is_disposed(&self) -> bool {
        self.lock_state().disposed
    }

    fn dispose(&self) {
        let mut state = self.lock_state();
        if state.disposed {
            return;
        }
        if let Some(mut transaction) = state.transaction.take() {
            transaction.dispose();
        }
        self.context.dispose();
        state.disposed = true;
        info!("event=uow_dispose module=uow status=ok");
    }
}

impl<C: DbContext> Drop for DbUnitOfWork<C> {
    fn drop(&mut self) {
        UnitOfWork::dispose(self);
    }
}

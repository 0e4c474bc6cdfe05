use rusqlite::{ffi, Connection};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use todolist_data::{
    Category, CategoryRepository, ContextTag, DbContext, DbError, DbResult, DbTransaction,
    DbUnitOfWork, EntityEntry, IsolationLevel, Repository, SqliteRepository, SqliteTransaction,
    SqliteUnitOfWorkFactory, ThingToDo, ToDoListDbContext, UnitOfWork, UnitOfWorkFactory,
    UnitOfWorkOptions, UowError, User, UserRepository,
};

/// Records every context/transaction call in order.
#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<&'static str>>,
}

impl CallLog {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|recorded| **recorded == call).count()
    }
}

#[derive(Clone, Copy, Default)]
struct Faults {
    commit: bool,
    rollback: bool,
}

struct RecordingContext {
    inner: ToDoListDbContext,
    recorder: Arc<CallLog>,
    faults: Faults,
}

struct RecordingTransaction {
    inner: SqliteTransaction,
    recorder: Arc<CallLog>,
    faults: Faults,
}

fn forced_failure(message: &str) -> DbError {
    DbError::Sqlite(rusqlite::Error::SqliteFailure(
        ffi::Error::new(ffi::SQLITE_BUSY),
        Some(message.to_string()),
    ))
}

impl DbContext for RecordingContext {
    type Transaction = RecordingTransaction;

    fn save_changes(&self) -> DbResult<usize> {
        self.recorder.record("save_changes");
        self.inner.save_changes()
    }

    fn begin_transaction(&self, isolation_level: IsolationLevel) -> DbResult<RecordingTransaction> {
        self.recorder.record("begin");
        Ok(RecordingTransaction {
            inner: self.inner.begin_transaction(isolation_level)?,
            recorder: Arc::clone(&self.recorder),
            faults: self.faults,
        })
    }

    fn track(&self, entry: EntityEntry) -> DbResult<()> {
        self.inner.track(entry)
    }

    fn pending_changes(&self) -> usize {
        self.inner.pending_changes()
    }

    fn with_connection<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        self.inner.with_connection(f)
    }

    fn dispose(&self) {
        self.recorder.record("context_dispose");
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl DbTransaction for RecordingTransaction {
    fn isolation_level(&self) -> IsolationLevel {
        self.inner.isolation_level()
    }

    fn commit(&mut self) -> DbResult<()> {
        self.recorder.record("commit");
        if self.faults.commit {
            return Err(forced_failure("forced commit failure"));
        }
        self.inner.commit()
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.recorder.record("rollback");
        if self.faults.rollback {
            return Err(forced_failure("forced rollback failure"));
        }
        self.inner.rollback()
    }

    fn dispose(&mut self) {
        self.recorder.record("tx_dispose");
        self.inner.dispose();
    }
}

fn recording_uow_on(
    inner: ToDoListDbContext,
    faults: Faults,
) -> (DbUnitOfWork<RecordingContext>, Arc<CallLog>) {
    let recorder = Arc::new(CallLog::default());
    let context = RecordingContext {
        inner,
        recorder: Arc::clone(&recorder),
        faults,
    };
    (DbUnitOfWork::new(Arc::new(context)), recorder)
}

fn recording_uow(faults: Faults) -> (DbUnitOfWork<RecordingContext>, Arc<CallLog>) {
    recording_uow_on(ToDoListDbContext::open_in_memory().unwrap(), faults)
}

fn address<T: ?Sized>(value: &T) -> usize {
    value as *const T as *const () as usize
}

#[test]
fn construct_without_context_fails() {
    let result = DbUnitOfWork::<ToDoListDbContext>::try_new(None);
    assert!(matches!(result, Err(UowError::MissingContext)));
}

#[test]
fn commit_without_begin_reports_missing_transaction() {
    let (uow, recorder) = recording_uow(Faults::default());

    let err = uow.commit_transaction().unwrap_err();
    assert!(matches!(err, UowError::MissingTransaction));
    assert!(err.to_string().contains("transaction"));
    assert!(recorder.calls().is_empty());
    assert!(!uow.is_disposed());
}

#[test]
fn rollback_without_begin_reports_missing_transaction() {
    let (uow, recorder) = recording_uow(Faults::default());

    assert!(matches!(
        uow.rollback_transaction(),
        Err(UowError::MissingTransaction)
    ));
    assert!(recorder.calls().is_empty());
}

#[test]
fn commit_disposes_transaction_and_context_exactly_once() {
    let (uow, recorder) = recording_uow(Faults::default());

    uow.begin_transaction().unwrap();
    assert!(uow.has_active_transaction());
    uow.commit_transaction().unwrap();

    assert!(!uow.has_active_transaction());
    assert!(uow.is_disposed());
    assert_eq!(
        recorder.calls(),
        vec!["begin", "commit", "tx_dispose", "context_dispose"]
    );

    uow.dispose();
    drop(uow);
    assert_eq!(recorder.count("tx_dispose"), 1);
    assert_eq!(recorder.count("context_dispose"), 1);
}

#[test]
fn rollback_disposes_transaction_and_context_exactly_once() {
    let (uow, recorder) = recording_uow(Faults::default());

    uow.begin_transaction().unwrap();
    uow.rollback_transaction().unwrap();
    drop(uow);

    assert_eq!(
        recorder.calls(),
        vec!["begin", "rollback", "tx_dispose", "context_dispose"]
    );
}

#[test]
fn failed_commit_rolls_back_once_then_returns_original_error() {
    let (uow, recorder) = recording_uow(Faults {
        commit: true,
        rollback: false,
    });

    uow.begin_transaction().unwrap();
    uow.users()
        .add(&User::new("ada", "ada@example.com"))
        .unwrap();
    uow.save_changes().unwrap();

    let err = uow.commit_transaction().unwrap_err();
    assert!(matches!(
        err,
        UowError::Persistence {
            operation: "commit_transaction",
            source: DbError::Sqlite(_),
        }
    ));
    assert!(err.to_string().contains("forced commit failure"));
    assert_eq!(
        recorder.calls(),
        vec![
            "begin",
            "save_changes",
            "commit",
            "rollback",
            "tx_dispose",
            "context_dispose"
        ]
    );
    assert!(uow.is_disposed());
}

#[test]
fn failed_rollback_is_retried_once_and_both_errors_surface() {
    let (uow, recorder) = recording_uow(Faults {
        commit: false,
        rollback: true,
    });

    uow.begin_transaction().unwrap();
    let err = uow.rollback_transaction().unwrap_err();

    assert!(matches!(
        err,
        UowError::CompensationFailed {
            operation: "rollback_transaction",
            ..
        }
    ));
    assert_eq!(recorder.count("rollback"), 2);
    assert_eq!(recorder.count("tx_dispose"), 1);
    assert_eq!(recorder.count("context_dispose"), 1);
}

#[test]
fn second_begin_is_rejected_while_transaction_is_live() {
    let (uow, recorder) = recording_uow(Faults::default());

    uow.begin_transaction().unwrap();
    assert!(matches!(
        uow.begin_transaction(),
        Err(UowError::TransactionAlreadyActive)
    ));
    assert_eq!(recorder.count("begin"), 1);
}

#[test]
fn operations_after_commit_report_missing_context() {
    let (uow, _recorder) = recording_uow(Faults::default());
    uow.begin_transaction().unwrap();
    uow.commit_transaction().unwrap();

    assert!(matches!(
        uow.begin_transaction(),
        Err(UowError::MissingContext)
    ));
    assert!(matches!(uow.save_changes(), Err(UowError::MissingContext)));
}

#[test]
fn dispose_is_idempotent() {
    let (uow, recorder) = recording_uow(Faults::default());
    uow.begin_transaction().unwrap();

    uow.dispose();
    uow.dispose();
    drop(uow);

    assert_eq!(recorder.calls(), vec!["begin", "tx_dispose", "context_dispose"]);
}

#[test]
fn repository_accessors_are_memoized() {
    let (uow, _recorder) = recording_uow(Faults::default());

    assert_eq!(address(uow.users()), address(uow.users()));
    assert_eq!(address(uow.categories()), address(uow.categories()));
    assert_eq!(address(uow.things_to_do()), address(uow.things_to_do()));
    assert_eq!(
        address(uow.task_assignment_histories()),
        address(uow.task_assignment_histories())
    );
}

#[test]
fn concurrent_first_access_to_different_repositories() {
    let (uow, _recorder) = recording_uow(Faults::default());
    let barrier = Barrier::new(2);

    let (users, categories) = thread::scope(|scope| {
        let users = scope.spawn(|| {
            barrier.wait();
            let repo: &dyn UserRepository = uow.users();
            repo.count().unwrap();
            address(repo)
        });
        let categories = scope.spawn(|| {
            barrier.wait();
            let repo: &dyn CategoryRepository = uow.categories();
            repo.count().unwrap();
            address(repo)
        });
        (users.join().unwrap(), categories.join().unwrap())
    });

    assert_ne!(users, categories);
    assert_eq!(users, address(uow.users()));
    assert_eq!(categories, address(uow.categories()));
}

#[test]
fn repositories_are_tagged_with_their_context_type() {
    let context = Arc::new(ToDoListDbContext::open_in_memory().unwrap());
    let repo: SqliteRepository<ToDoListDbContext, User> =
        SqliteRepository::new(context, ContextTag::of::<ToDoListDbContext>());

    assert!(repo.context_tag().is::<ToDoListDbContext>());
    assert!(repo.context_tag().name().ends_with("ToDoListDbContext"));
}

#[test]
fn default_isolation_allows_dirty_reads_and_is_configurable() {
    let read_uncommitted = |options: UnitOfWorkOptions| -> i64 {
        let context = Arc::new(ToDoListDbContext::open_in_memory().unwrap());
        let uow = DbUnitOfWork::with_options(Arc::clone(&context), options);
        uow.begin_transaction().unwrap();
        context
            .with_connection(|conn| {
                conn.pragma_query_value(None, "read_uncommitted", |row| row.get(0))
                    .map_err(DbError::from)
            })
            .unwrap()
    };

    assert_eq!(UnitOfWorkOptions::default().isolation_level, IsolationLevel::ReadUncommitted);
    assert_eq!(read_uncommitted(UnitOfWorkOptions::default()), 1);
    assert_eq!(
        read_uncommitted(UnitOfWorkOptions {
            isolation_level: IsolationLevel::Serializable,
        }),
        0
    );
}

#[test]
fn scenario_begin_save_commit_persists_and_disposes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.db");
    let (uow, recorder) =
        recording_uow_on(ToDoListDbContext::open(&path).unwrap(), Faults::default());
    let user = User::new("grace", "grace@example.com");

    uow.begin_transaction().unwrap();
    uow.users().add(&user).unwrap();
    let saved = uow.save_changes().unwrap();
    uow.commit_transaction().unwrap();

    assert_eq!(saved, 1);
    assert!(uow.is_disposed());
    assert_eq!(recorder.count("tx_dispose"), 1);
    assert_eq!(recorder.count("context_dispose"), 1);

    let reopened = DbUnitOfWork::new(Arc::new(ToDoListDbContext::open(&path).unwrap()));
    assert_eq!(reopened.users().find(user.id).unwrap(), Some(user));
}

#[test]
fn deferred_foreign_key_violation_fails_commit_and_nothing_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deferred.db");
    let (uow, recorder) =
        recording_uow_on(ToDoListDbContext::open(&path).unwrap(), Faults::default());
    let orphan_owner = User::new("nobody", "nobody@example.com");
    let orphan_category = Category::new(orphan_owner.id, "Nowhere");
    let thing = ThingToDo::new(orphan_category.id, orphan_owner.id, "dangling");

    uow.begin_transaction().unwrap();
    uow.things_to_do().add(&thing).unwrap();
    assert_eq!(uow.save_changes().unwrap(), 1);

    let err = uow.commit_transaction().unwrap_err();
    assert!(matches!(
        err,
        UowError::Persistence {
            operation: "commit_transaction",
            source: DbError::Sqlite(_),
        }
    ));
    assert_eq!(recorder.count("rollback"), 1);

    let reopened = DbUnitOfWork::new(Arc::new(ToDoListDbContext::open(&path).unwrap()));
    assert_eq!(reopened.things_to_do().count().unwrap(), 0);
}

#[test]
fn factory_checks_schema_only_on_first_create() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("factory.db");
    let factory = SqliteUnitOfWorkFactory::new(&path);
    drop(factory.create().unwrap());

    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 999;")
        .unwrap();

    let reused = factory.clone().create();
    assert!(reused.is_ok());
    drop(reused);

    let fresh = SqliteUnitOfWorkFactory::new(&path).create();
    assert!(matches!(
        fresh.err(),
        Some(UowError::Persistence {
            operation: "open_context",
            source: DbError::UnsupportedSchemaVersion {
                db_version: 999,
                ..
            },
        })
    ));
}

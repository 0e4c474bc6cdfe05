//! Data-access layer of the to-do list application.
//!
//! A [`DbUnitOfWork`] wraps one [`ToDoListDbContext`], hands out lazily
//! created repositories for users, categories, things to do and task
//! assignment history, and forwards save/begin/commit/rollback to SQLite.

pub mod api_model;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use api_model::category::{CategoryRequestBase, CreateCategoryRequest, UpdateCategoryRequest};
pub use api_model::{FieldError, RequestValidationError, Validate};
pub use context::{
    ContextTag, DbContext, DbTransaction, EntityEntry, EntityState, IsolationLevel,
    SqliteTransaction, ToDoListDbContext, TrackedEntity, TransactionState,
};
pub use db::{ContextOptions, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::assignment_history::TaskAssignmentHistory;
pub use model::category::Category;
pub use model::thing_to_do::ThingToDo;
pub use model::user::User;
pub use model::ValidationError;
pub use repo::assignment_history_repo::TaskAssignmentHistoryRepository;
pub use repo::category_repo::CategoryRepository;
pub use repo::thing_to_do_repo::ThingToDoRepository;
pub use repo::user_repo::UserRepository;
pub use repo::{PageQuery, RepoError, RepoResult, Repository, SqliteRepository};
pub use service::assignment_service::{AssignTaskRequest, AssignmentService};
pub use service::category_service::CategoryService;
pub use service::{ServiceError, ServiceResult};
pub use uow::{
    DbUnitOfWork, SqliteUnitOfWorkFactory, UnitOfWork, UnitOfWorkFactory, UnitOfWorkOptions,
    UowError, UowResult,
};

/// Returns the data-layer crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Writes enforce entity `validate()` before a change is staged.
//! - Writes are staged on the shared context and only reach the database
//!   on `save_changes`; reads always go to the database.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod assignment_history_repo;
pub mod category_repo;
pub mod entity;
mod sqlite_repo;
pub mod thing_to_do_repo;
pub mod user_repo;

pub use sqlite_repo::SqliteRepository;

use crate::db::DbError;
use crate::model::ValidationError;
use entity::Entity;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Paging options for list queries ordered by `created_at DESC, id ASC`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl PageQuery {
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }
}

/// CRUD capability shared by every entity repository.
pub trait Repository<E: Entity>: Send + Sync {
    /// Validates and stages an insert; returns the entity ID.
    fn add(&self, entity: &E) -> RepoResult<Uuid>;
    /// Validates and stages a full-row update.
    fn update(&self, entity: &E) -> RepoResult<()>;
    /// Stages deletion of an existing row; `NotFound` when it does not exist.
    fn remove(&self, id: Uuid) -> RepoResult<()>;
    fn find(&self, id: Uuid) -> RepoResult<Option<E>>;
    fn list(&self, query: &PageQuery) -> RepoResult<Vec<E>>;
    fn count(&self) -> RepoResult<u64>;
}

//! Application use-case services.
//!
//! # Responsibility
//! - Compose repository calls into business transactions through one
//!   unit of work per use case.
//! - Keep API/CLI layers decoupled from storage details.
//!
//! # Invariants
//! - A failing business transaction is rolled back and its original error
//!   returned.

pub mod assignment_service;
pub mod category_service;

use crate::api_model::RequestValidationError;
use crate::repo::RepoError;
use crate::uow::{UnitOfWork, UowError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    InvalidRequest(RequestValidationError),
    NotFound { entity: &'static str, id: Uuid },
    Repo(RepoError),
    Uow(UowError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Uow(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRequest(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Uow(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<RequestValidationError> for ServiceError {
    fn from(value: RequestValidationError) -> Self {
        Self::InvalidRequest(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<UowError> for ServiceError {
    fn from(value: UowError) -> Self {
        Self::Uow(value)
    }
}

/// Runs `work` inside a transaction on `uow`, saving and committing on
/// success and rolling back on any error.
pub(crate) fn run_in_transaction<U, T>(
    uow: &U,
    work: impl FnOnce(&U) -> ServiceResult<T>,
) -> ServiceResult<T>
where
    U: UnitOfWork + ?Sized,
{
    uow.begin_transaction()?;

    let outcome = work(uow).and_then(|value| {
        uow.save_changes()?;
        Ok(value)
    });

    match outcome {
        Ok(value) => {
            uow.commit_transaction()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback_transaction() {
                warn!(
                    "event=service_rollback module=service status=error error={rollback_err} cause={err}"
                );
            }
            Err(err)
        }
    }
}

pub(crate) fn not_found<T>(entity: &'static str, id: Uuid) -> ServiceResult<T> {
    Err(ServiceError::NotFound { entity, id })
}

#[cfg(test)]
mod tests {
    use super::{run_in_transaction, ServiceError};
    use crate::context::ToDoListDbContext;
    use crate::model::user::User;
    use crate::uow::{DbUnitOfWork, UnitOfWork};
    use std::sync::Arc;

    #[test]
    fn failure_after_flush_rolls_back_written_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("rollback.db");
        let uow = DbUnitOfWork::new(Arc::new(
            ToDoListDbContext::open(&path).expect("open context"),
        ));
        let user = User::new("flushed", "flushed@example.com");

        let result: Result<(), ServiceError> = run_in_transaction(&uow, |uow| {
            uow.users().add(&user)?;
            assert_eq!(uow.save_changes()?, 1);
            assert!(uow.users().find(user.id)?.is_some());
            super::not_found("thing_to_do", user.id)
        });

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert!(uow.is_disposed());

        let reopened = DbUnitOfWork::new(Arc::new(
            ToDoListDbContext::open(&path).expect("reopen context"),
        ));
        assert!(reopened.users().find(user.id).expect("find").is_none());
    }
}

//! Result-returning call boundaries around persistence operations.

use super::{UowError, UowResult};
use crate::db::DbResult;
use log::{error, warn};

/// Runs `action` and tags a failure with `operation`.
pub(crate) fn try_catch<T>(
    operation: &'static str,
    action: impl FnOnce() -> DbResult<T>,
) -> UowResult<T> {
    action().map_err(|source| {
        error!("event=uow_call module=uow status=error operation={operation} error={source}");
        UowError::Persistence { operation, source }
    })
}

/// Runs `action` on `resource`; on failure runs `compensate` once, then
/// returns the original error (paired with the compensation error if that
/// failed too).
pub(crate) fn try_catch_compensate<R: ?Sized, T>(
    operation: &'static str,
    resource: &mut R,
    action: impl FnOnce(&mut R) -> DbResult<T>,
    compensate: impl FnOnce(&mut R) -> DbResult<()>,
) -> UowResult<T> {
    let original = match action(&mut *resource) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    warn!(
        "event=uow_call module=uow status=error operation={operation} compensate=rollback error={original}"
    );
    match compensate(resource) {
        Ok(()) => Err(UowError::Persistence {
            operation,
            source: original,
        }),
        Err(compensation) => {
            error!(
                "event=uow_call module=uow status=error operation={operation} error_code=compensation_failed error={compensation}"
            );
            Err(UowError::CompensationFailed {
                operation,
                original,
                compensation,
            })
        }
    }
}

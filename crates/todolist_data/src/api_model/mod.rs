//! Request payloads bound by the web API layer.
//!
//! # Responsibility
//! - Define flat, serde-bindable request shapes.
//! - Declare per-field validation rules and their user-facing messages.
//!
//! # Invariants
//! - `validate` reports every failing field, not just the first one.
//! - Messages are stable constants so callers can match on them.

pub mod category;

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-facing validation messages.
pub mod messages {
    pub const CATEGORY_ID_CANNOT_BE_EMPTY: &str = "Category id cannot be empty.";
    pub const CATEGORY_NAME_CANNOT_BE_EMPTY: &str = "Category name cannot be empty.";
    pub const CATEGORY_STATUS_CANNOT_BE_EMPTY: &str = "Category status cannot be empty.";
    pub const OWNER_ID_CANNOT_BE_EMPTY: &str = "Owner id cannot be empty.";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the request JSON.
    pub field: &'static str,
    pub message: &'static str,
}

/// All field errors found in one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestValidationError {
    pub errors: Vec<FieldError>,
}

impl RequestValidationError {
    pub fn has_message(&self, message: &str) -> bool {
        self.errors.iter().any(|error| error.message == message)
    }
}

impl Display for RequestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "invalid request: {joined}")
    }
}

impl Error for RequestValidationError {}

/// Declared validation rules of a request payload.
pub trait Validate {
    fn validate(&self) -> Result<(), RequestValidationError>;
}

/// Accumulates field errors for one `validate` call.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub(crate) fn require(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok {
            self.0.push(FieldError { field, message });
        }
    }

    pub(crate) fn finish(self) -> Result<(), RequestValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(RequestValidationError { errors: self.0 })
        }
    }
}

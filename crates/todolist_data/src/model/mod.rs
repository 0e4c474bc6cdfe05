//! Domain entities of the to-do list.
//!
//! # Responsibility
//! - Define the four persisted entity shapes.
//! - Own field-level validation rules enforced before any write.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Timestamps are Unix epoch milliseconds.

pub mod assignment_history;
pub mod category;
pub mod thing_to_do;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Field-level validation failure for an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Text field exceeds its maximum length in characters.
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
    /// Field value does not match its expected format.
    InvalidFormat { field: &'static str, value: String },
    /// Numeric field is outside its accepted range.
    OutOfRange { field: &'static str, value: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::TooLong { field, max_chars } => {
                write!(f, "`{field}` must be at most {max_chars} characters")
            }
            Self::InvalidFormat { field, value } => {
                write!(f, "`{field}` has an invalid format: `{value}`")
            }
            Self::OutOfRange { field, value } => write!(f, "`{field}` is out of range: {value}"),
        }
    }
}

impl Error for ValidationError {}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    limit_text(field, Some(value), max_chars)
}

pub(crate) fn limit_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(text) if text.chars().count() > max_chars => {
            Err(ValidationError::TooLong { field, max_chars })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{limit_text, require_text, ValidationError};

    #[test]
    fn require_text_rejects_whitespace_only() {
        assert_eq!(
            require_text("name", "   ", 10),
            Err(ValidationError::EmptyField("name"))
        );
    }

    #[test]
    fn limit_text_counts_chars_not_bytes() {
        assert!(limit_text("name", Some("çççç"), 4).is_ok());
        assert!(matches!(
            limit_text("name", Some("ççççç"), 4),
            Err(ValidationError::TooLong { max_chars: 4, .. })
        ));
    }
}

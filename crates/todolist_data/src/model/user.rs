//! User entity.

use super::{limit_text, now_epoch_ms, require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

const MAX_USER_NAME_CHARS: usize = 64;
const MAX_PERSON_NAME_CHARS: usize = 100;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Account that owns categories and can be assigned tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login handle; no whitespace allowed.
    pub user_name: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Inactive users are kept for history but hidden from `list_active`.
    pub is_active: bool,
    pub created_at: i64,
}

impl User {
    /// Creates an active user with a generated stable ID.
    pub fn new(user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user_name.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            is_active: true,
            created_at: now_epoch_ms(),
        }
    }

    /// Checks field rules before the user is staged for persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("user_name", &self.user_name, MAX_USER_NAME_CHARS)?;
        if self.user_name.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "user_name",
                value: self.user_name.clone(),
            });
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                value: self.email.clone(),
            });
        }
        limit_text("first_name", self.first_name.as_deref(), MAX_PERSON_NAME_CHARS)?;
        limit_text("last_name", self.last_name.as_deref(), MAX_PERSON_NAME_CHARS)?;
        Ok(())
    }
}

//! Category entity.

use super::user::UserId;
use super::{limit_text, now_epoch_ms, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;

const MAX_NAME_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 500;

/// User-owned grouping of things to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    /// Enabled/disabled flag exposed to API callers as `categoryStatus`.
    pub status: bool,
    pub created_at: i64,
}

impl Category {
    /// Creates an enabled category owned by `owner_id`.
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            description: None,
            status: true,
            created_at: now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_NAME_CHARS)?;
        limit_text(
            "description",
            self.description.as_deref(),
            MAX_DESCRIPTION_CHARS,
        )
    }
}

//! ThingToDo entity: one actionable item inside a category.

use super::category::CategoryId;
use super::user::UserId;
use super::{limit_text, now_epoch_ms, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ThingToDoId = Uuid;

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingToDo {
    pub id: ThingToDoId,
    pub category_id: CategoryId,
    pub owner_id: UserId,
    /// Current assignee; history of changes lives in `TaskAssignmentHistory`.
    pub assignee_id: Option<UserId>,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    /// Optional deadline in epoch milliseconds.
    pub due_at: Option<i64>,
    pub created_at: i64,
}

impl ThingToDo {
    /// Creates an open, unassigned item.
    pub fn new(category_id: CategoryId, owner_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            owner_id,
            assignee_id: None,
            title: title.into(),
            description: None,
            is_completed: false,
            due_at: None,
            created_at: now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, MAX_TITLE_CHARS)?;
        limit_text(
            "description",
            self.description.as_deref(),
            MAX_DESCRIPTION_CHARS,
        )?;
        if let Some(due_at) = self.due_at {
            if due_at < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "due_at",
                    value: due_at,
                });
            }
        }
        Ok(())
    }

    pub fn complete(&mut self) {
        self.is_completed = true;
    }

    pub fn reopen(&mut self) {
        self.is_completed = false;
    }
}

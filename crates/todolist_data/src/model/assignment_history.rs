//! Append-only record of who assigned a task to whom.

use super::thing_to_do::ThingToDoId;
use super::user::UserId;
use super::{limit_text, now_epoch_ms, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskAssignmentHistoryId = Uuid;

const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignmentHistory {
    pub id: TaskAssignmentHistoryId,
    pub thing_to_do_id: ThingToDoId,
    pub assigned_user_id: UserId,
    pub assigned_by_user_id: UserId,
    pub assigned_at: i64,
    pub note: Option<String>,
    pub created_at: i64,
}

impl TaskAssignmentHistory {
    /// Records an assignment happening now.
    pub fn new(
        thing_to_do_id: ThingToDoId,
        assigned_user_id: UserId,
        assigned_by_user_id: UserId,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            thing_to_do_id,
            assigned_user_id,
            assigned_by_user_id,
            assigned_at: now,
            note: None,
            created_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.assigned_at < 0 {
            return Err(ValidationError::OutOfRange {
                field: "assigned_at",
                value: self.assigned_at,
            });
        }
        limit_text("note", self.note.as_deref(), MAX_NOTE_CHARS)
    }
}

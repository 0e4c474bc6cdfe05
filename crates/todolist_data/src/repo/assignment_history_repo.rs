//! Task assignment history repository contract and table mapping.

use super::entity::{opt_text_value, read_uuid, uuid_value, Entity};
use super::{RepoResult, Repository, SqliteRepository};
use crate::context::{DbContext, TrackedEntity};
use crate::model::assignment_history::TaskAssignmentHistory;
use crate::model::thing_to_do::ThingToDoId;
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

pub type SqliteTaskAssignmentHistoryRepository<C> = SqliteRepository<C, TaskAssignmentHistory>;

pub trait TaskAssignmentHistoryRepository: Repository<TaskAssignmentHistory> {
    /// Full history of one task, oldest first.
    fn list_for_task(&self, thing_to_do_id: ThingToDoId)
        -> RepoResult<Vec<TaskAssignmentHistory>>;
    fn latest_for_task(
        &self,
        thing_to_do_id: ThingToDoId,
    ) -> RepoResult<Option<TaskAssignmentHistory>>;
}

impl<C: DbContext> TaskAssignmentHistoryRepository
    for SqliteRepository<C, TaskAssignmentHistory>
{
    fn list_for_task(
        &self,
        thing_to_do_id: ThingToDoId,
    ) -> RepoResult<Vec<TaskAssignmentHistory>> {
        // rowid breaks ties between assignments stamped in the same millisecond.
        self.query(
            "WHERE thing_to_do_id = ?1 ORDER BY assigned_at ASC, rowid ASC",
            vec![uuid_value(thing_to_do_id)],
        )
    }

    fn latest_for_task(
        &self,
        thing_to_do_id: ThingToDoId,
    ) -> RepoResult<Option<TaskAssignmentHistory>> {
        self.query_first(
            "WHERE thing_to_do_id = ?1 ORDER BY assigned_at DESC, rowid DESC LIMIT 1",
            vec![uuid_value(thing_to_do_id)],
        )
    }
}

impl Entity for TaskAssignmentHistory {
    const KIND: &'static str = "task_assignment_history";
    const TABLE: &'static str = "task_assignment_histories";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "thing_to_do_id",
        "assigned_user_id",
        "assigned_by_user_id",
        "assigned_at",
        "note",
        "created_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        TaskAssignmentHistory::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            uuid_value(self.thing_to_do_id),
            uuid_value(self.assigned_user_id),
            uuid_value(self.assigned_by_user_id),
            Value::Integer(self.assigned_at),
            opt_text_value(self.note.as_deref()),
            Value::Integer(self.created_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let history = TaskAssignmentHistory {
            id: read_uuid(row, "id")?,
            thing_to_do_id: read_uuid(row, "thing_to_do_id")?,
            assigned_user_id: read_uuid(row, "assigned_user_id")?,
            assigned_by_user_id: read_uuid(row, "assigned_by_user_id")?,
            assigned_at: row.get("assigned_at")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
        };
        history.validate()?;
        Ok(history)
    }

    fn into_tracked(self) -> TrackedEntity {
        TrackedEntity::TaskAssignmentHistory(self)
    }
}

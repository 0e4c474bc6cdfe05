//! ThingToDo repository contract and table mapping.

use super::entity::{
    bool_value, opt_int_value, opt_text_value, opt_uuid_value, read_bool, read_opt_uuid,
    read_uuid, text_value, uuid_value, Entity,
};
use super::{RepoResult, Repository, SqliteRepository};
use crate::context::{DbContext, TrackedEntity};
use crate::model::category::CategoryId;
use crate::model::thing_to_do::ThingToDo;
use crate::model::user::UserId;
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

pub type SqliteThingToDoRepository<C> = SqliteRepository<C, ThingToDo>;

const OPEN_FIRST_ORDER: &str = "ORDER BY is_completed ASC, due_at IS NULL, due_at ASC, id ASC";

pub trait ThingToDoRepository: Repository<ThingToDo> {
    /// Items in one category; open ones first, then by due date.
    fn list_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<ThingToDo>>;
    fn list_assigned_to(&self, user_id: UserId) -> RepoResult<Vec<ThingToDo>>;
    fn list_open_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<ThingToDo>>;
}

impl<C: DbContext> ThingToDoRepository for SqliteRepository<C, ThingToDo> {
    fn list_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<ThingToDo>> {
        self.query(
            &format!("WHERE category_id = ?1 {OPEN_FIRST_ORDER}"),
            vec![uuid_value(category_id)],
        )
    }

    fn list_assigned_to(&self, user_id: UserId) -> RepoResult<Vec<ThingToDo>> {
        self.query(
            &format!("WHERE assignee_id = ?1 {OPEN_FIRST_ORDER}"),
            vec![uuid_value(user_id)],
        )
    }

    fn list_open_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<ThingToDo>> {
        self.query(
            &format!("WHERE owner_id = ?1 AND is_completed = 0 {OPEN_FIRST_ORDER}"),
            vec![uuid_value(owner_id)],
        )
    }
}

impl Entity for ThingToDo {
    const KIND: &'static str = "thing_to_do";
    const TABLE: &'static str = "things_to_do";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "category_id",
        "owner_id",
        "assignee_id",
        "title",
        "description",
        "is_completed",
        "due_at",
        "created_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ThingToDo::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            uuid_value(self.category_id),
            uuid_value(self.owner_id),
            opt_uuid_value(self.assignee_id),
            text_value(&self.title),
            opt_text_value(self.description.as_deref()),
            bool_value(self.is_completed),
            opt_int_value(self.due_at),
            Value::Integer(self.created_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let thing = ThingToDo {
            id: read_uuid(row, "id")?,
            category_id: read_uuid(row, "category_id")?,
            owner_id: read_uuid(row, "owner_id")?,
            assignee_id: read_opt_uuid(row, "assignee_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            is_completed: read_bool(row, "is_completed")?,
            due_at: row.get("due_at")?,
            created_at: row.get("created_at")?,
        };
        thing.validate()?;
        Ok(thing)
    }

    fn into_tracked(self) -> TrackedEntity {
        TrackedEntity::ThingToDo(self)
    }
}

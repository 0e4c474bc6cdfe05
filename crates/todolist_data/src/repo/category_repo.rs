//! Category repository contract and table mapping.

use super::entity::{
    bool_value, opt_text_value, read_bool, read_uuid, text_value, uuid_value, Entity,
};
use super::{RepoResult, Repository, SqliteRepository};
use crate::context::{DbContext, TrackedEntity};
use crate::model::category::Category;
use crate::model::user::UserId;
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

pub type SqliteCategoryRepository<C> = SqliteRepository<C, Category>;

pub trait CategoryRepository: Repository<Category> {
    /// Categories owned by `owner_id`, ordered by name.
    fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Category>>;
    fn list_by_status(&self, status: bool) -> RepoResult<Vec<Category>>;
}

impl<C: DbContext> CategoryRepository for SqliteRepository<C, Category> {
    fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Category>> {
        self.query(
            "WHERE owner_id = ?1 ORDER BY name ASC, id ASC",
            vec![uuid_value(owner_id)],
        )
    }

    fn list_by_status(&self, status: bool) -> RepoResult<Vec<Category>> {
        self.query(
            "WHERE status = ?1 ORDER BY name ASC, id ASC",
            vec![bool_value(status)],
        )
    }
}

impl Entity for Category {
    const KIND: &'static str = "category";
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "owner_id",
        "name",
        "description",
        "status",
        "created_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Category::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            uuid_value(self.owner_id),
            text_value(&self.name),
            opt_text_value(self.description.as_deref()),
            bool_value(self.status),
            Value::Integer(self.created_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let category = Category {
            id: read_uuid(row, "id")?,
            owner_id: read_uuid(row, "owner_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            status: read_bool(row, "status")?,
            created_at: row.get("created_at")?,
        };
        category.validate()?;
        Ok(category)
    }

    fn into_tracked(self) -> TrackedEntity {
        TrackedEntity::Category(self)
    }
}

//! User repository contract and table mapping.

use super::entity::{
    bool_value, opt_text_value, read_bool, read_uuid, text_value, uuid_value, Entity,
};
use super::{RepoResult, Repository, SqliteRepository};
use crate::context::{DbContext, TrackedEntity};
use crate::model::user::User;
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

pub type SqliteUserRepository<C> = SqliteRepository<C, User>;

pub trait UserRepository: Repository<User> {
    fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<User>>;
    /// Active users ordered by user name.
    fn list_active(&self) -> RepoResult<Vec<User>>;
}

impl<C: DbContext> UserRepository for SqliteRepository<C, User> {
    fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<User>> {
        self.query_first("WHERE user_name = ?1", vec![text_value(user_name)])
    }

    fn list_active(&self) -> RepoResult<Vec<User>> {
        self.query("WHERE is_active = 1 ORDER BY user_name ASC", Vec::new())
    }
}

impl Entity for User {
    const KIND: &'static str = "user";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_name",
        "email",
        "first_name",
        "last_name",
        "is_active",
        "created_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        User::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            text_value(&self.user_name),
            text_value(&self.email),
            opt_text_value(self.first_name.as_deref()),
            opt_text_value(self.last_name.as_deref()),
            bool_value(self.is_active),
            Value::Integer(self.created_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let user = User {
            id: read_uuid(row, "id")?,
            user_name: row.get("user_name")?,
            email: row.get("email")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            is_active: read_bool(row, "is_active")?,
            created_at: row.get("created_at")?,
        };
        user.validate()?;
        Ok(user)
    }

    fn into_tracked(self) -> TrackedEntity {
        TrackedEntity::User(self)
    }
}

//! Table mapping shared by all entity repositories.

use super::{RepoError, RepoResult};
use crate::context::{EntityState, TrackedEntity};
use crate::db::{DbError, DbResult};
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use uuid::Uuid;

/// Persisted entity with a fixed table layout.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable kind used in errors and log events.
    const KIND: &'static str;
    const TABLE: &'static str;
    /// Column names in bind order. `id` must come first.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;
    fn validate(&self) -> Result<(), ValidationError>;
    /// Column values in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
    fn into_tracked(self) -> TrackedEntity;
}

pub(crate) fn select_sql<E: Entity>() -> String {
    format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

fn insert_sql<E: Entity>() -> String {
    let placeholders = (1..=E::COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders});",
        E::TABLE,
        E::COLUMNS.join(", ")
    )
}

fn update_sql<E: Entity>() -> String {
    let assignments = E::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE {} SET {assignments} WHERE id = ?1;", E::TABLE)
}

/// Writes one staged change and returns the affected row count.
///
/// Updates and deletes that match no row fail with `ConcurrencyConflict`.
pub(crate) fn persist<E: Entity>(
    conn: &Connection,
    state: EntityState,
    entity: &E,
) -> DbResult<usize> {
    let changed = match state {
        EntityState::Added => conn
            .prepare_cached(&insert_sql::<E>())?
            .execute(params_from_iter(entity.to_values()))?,
        EntityState::Modified => conn
            .prepare_cached(&update_sql::<E>())?
            .execute(params_from_iter(entity.to_values()))?,
        EntityState::Deleted => conn
            .prepare_cached(&format!("DELETE FROM {} WHERE id = ?1;", E::TABLE))?
            .execute([entity.id().to_string()])?,
    };

    if changed == 0 && state != EntityState::Added {
        return Err(DbError::ConcurrencyConflict {
            entity: E::KIND,
            id: entity.id(),
        });
    }
    Ok(changed)
}

pub(crate) fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn opt_uuid_value(id: Option<Uuid>) -> Value {
    id.map_or(Value::Null, uuid_value)
}

pub(crate) fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn opt_text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text_value)
}

pub(crate) fn bool_value(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

pub(crate) fn opt_int_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

pub(crate) fn read_uuid(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    parse_uuid(&text, column)
}

pub(crate) fn read_opt_uuid(row: &Row<'_>, column: &str) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => parse_uuid(&text, column).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn read_bool(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in column `{column}`"
        ))),
    }
}

fn parse_uuid(text: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in column `{column}`"))
    })
}

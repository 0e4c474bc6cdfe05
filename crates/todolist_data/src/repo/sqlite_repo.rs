//! Generic SQLite repository bound to a shared database context.

use super::entity::{select_sql, Entity};
use super::{PageQuery, RepoError, RepoResult, Repository};
use crate::context::{ContextTag, DbContext, EntityEntry, EntityState};
use log::debug;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for entity `E` on context `C`.
///
/// Holds a shared reference to the context; it never owns or disposes it.
pub struct SqliteRepository<C: DbContext, E: Entity> {
    context: Arc<C>,
    in_which_context: ContextTag,
    _entity: PhantomData<fn() -> E>,
}

impl<C: DbContext, E: Entity> SqliteRepository<C, E> {
    pub fn new(context: Arc<C>, in_which_context: ContextTag) -> Self {
        debug!(
            "event=repo_init module=repo status=ok entity={} context={}",
            E::KIND,
            in_which_context.name()
        );
        Self {
            context,
            in_which_context,
            _entity: PhantomData,
        }
    }

    pub fn context_tag(&self) -> ContextTag {
        self.in_which_context
    }

    /// Runs `SELECT <columns> FROM <table> <tail>` and maps every row.
    pub(crate) fn query(&self, tail: &str, bind_values: Vec<Value>) -> RepoResult<Vec<E>> {
        let sql = format!("{} {tail}", select_sql::<E>());
        self.context.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut items = Vec::new();
            while let Some(row) = rows.next()? {
                items.push(E::from_row(row)?);
            }
            Ok(items)
        })
    }

    pub(crate) fn query_first(
        &self,
        tail: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Option<E>> {
        Ok(self.query(tail, bind_values)?.into_iter().next())
    }

    fn stage(&self, state: EntityState, entity: &E) -> RepoResult<()> {
        self.context
            .track(EntityEntry::new(state, entity.clone().into_tracked()))?;
        Ok(())
    }
}

impl<C: DbContext, E: Entity> Repository<E> for SqliteRepository<C, E> {
    fn add(&self, entity: &E) -> RepoResult<Uuid> {
        entity.validate()?;
        self.stage(EntityState::Added, entity)?;
        Ok(entity.id())
    }

    fn update(&self, entity: &E) -> RepoResult<()> {
        entity.validate()?;
        self.stage(EntityState::Modified, entity)
    }

    fn remove(&self, id: Uuid) -> RepoResult<()> {
        let entity = self.find(id)?.ok_or(RepoError::NotFound {
            entity: E::KIND,
            id,
        })?;
        self.stage(EntityState::Deleted, &entity)
    }

    fn find(&self, id: Uuid) -> RepoResult<Option<E>> {
        self.query_first("WHERE id = ?1", vec![Value::Text(id.to_string())])
    }

    fn list(&self, query: &PageQuery) -> RepoResult<Vec<E>> {
        let mut tail = String::from("ORDER BY created_at DESC, id ASC");
        let mut bind_values = Vec::new();

        if let Some(limit) = query.limit {
            tail.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                tail.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            tail.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.query(&tail, bind_values)
    }

    fn count(&self) -> RepoResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {};", E::TABLE);
        let count = self.context.with_connection(|conn| {
            conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
                .map_err(RepoError::from)
        })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

//! Pending entity changes awaiting `save_changes`.

use crate::db::DbResult;
use crate::model::assignment_history::TaskAssignmentHistory;
use crate::model::category::Category;
use crate::model::thing_to_do::ThingToDo;
use crate::model::user::User;
use crate::repo::entity::{persist, Entity};
use rusqlite::Connection;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
}

impl EntityState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

/// Snapshot of an entity value taken when the change was staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedEntity {
    User(User),
    Category(Category),
    ThingToDo(ThingToDo),
    TaskAssignmentHistory(TaskAssignmentHistory),
}

impl TrackedEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => User::KIND,
            Self::Category(_) => Category::KIND,
            Self::ThingToDo(_) => ThingToDo::KIND,
            Self::TaskAssignmentHistory(_) => TaskAssignmentHistory::KIND,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::User(entity) => entity.id,
            Self::Category(entity) => entity.id,
            Self::ThingToDo(entity) => entity.id,
            Self::TaskAssignmentHistory(entity) => entity.id,
        }
    }

    fn persist(&self, conn: &Connection, state: EntityState) -> DbResult<usize> {
        match self {
            Self::User(entity) => persist(conn, state, entity),
            Self::Category(entity) => persist(conn, state, entity),
            Self::ThingToDo(entity) => persist(conn, state, entity),
            Self::TaskAssignmentHistory(entity) => persist(conn, state, entity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEntry {
    pub state: EntityState,
    pub entity: TrackedEntity,
}

impl EntityEntry {
    pub fn new(state: EntityState, entity: TrackedEntity) -> Self {
        Self { state, entity }
    }
}

/// Ordered list of staged changes. Flushed in insertion order.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: Vec<EntityEntry>,
}

impl ChangeTracker {
    pub fn track(&mut self, entry: EntityEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[EntityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Applies every entry on `conn` and returns the summed affected rows.
    ///
    /// Stops at the first failure; the caller owns rollback of partial writes.
    pub(crate) fn apply(&self, conn: &Connection) -> DbResult<usize> {
        let mut affected = 0;
        for entry in &self.entries {
            affected += entry.entity.persist(conn, entry.state)?;
        }
        Ok(affected)
    }
}

//! Task assignment use-case service.
//!
//! # Invariants
//! - Changing a task's assignee and recording the history row happen in
//!   the same transaction.

use super::{not_found, run_in_transaction, ServiceResult};
use crate::model::assignment_history::TaskAssignmentHistory;
use crate::model::thing_to_do::{ThingToDo, ThingToDoId};
use crate::model::user::{User, UserId};
use crate::repo::entity::Entity;
use crate::uow::{UnitOfWork, UnitOfWorkFactory};
use log::info;

/// Input of one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignTaskRequest {
    pub thing_to_do_id: ThingToDoId,
    pub assignee_id: UserId,
    pub assigned_by_id: UserId,
    pub note: Option<String>,
}

pub struct AssignmentService<F: UnitOfWorkFactory> {
    factory: F,
}

impl<F: UnitOfWorkFactory> AssignmentService<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Assigns a task and appends the matching history record.
    pub fn assign_task(&self, request: &AssignTaskRequest) -> ServiceResult<TaskAssignmentHistory> {
        let uow = self.factory.create()?;

        let history = run_in_transaction(&uow, |uow| {
            let Some(mut thing) = uow.things_to_do().find(request.thing_to_do_id)? else {
                return not_found(ThingToDo::KIND, request.thing_to_do_id);
            };
            for user_id in [request.assignee_id, request.assigned_by_id] {
                if uow.users().find(user_id)?.is_none() {
                    return not_found(User::KIND, user_id);
                }
            }

            thing.assignee_id = Some(request.assignee_id);
            uow.things_to_do().update(&thing)?;

            let mut history = TaskAssignmentHistory::new(
                request.thing_to_do_id,
                request.assignee_id,
                request.assigned_by_id,
            );
            history.note = request.note.clone();
            uow.task_assignment_histories().add(&history)?;
            Ok(history)
        })?;

        info!(
            "event=task_assign module=service status=ok thing_to_do_id={} assignee_id={}",
            history.thing_to_do_id, history.assigned_user_id
        );
        Ok(history)
    }

    /// Assignment history of one task, oldest first.
    pub fn assignment_history(
        &self,
        thing_to_do_id: ThingToDoId,
    ) -> ServiceResult<Vec<TaskAssignmentHistory>> {
        let uow = self.factory.create()?;
        Ok(uow
            .task_assignment_histories()
            .list_for_task(thing_to_do_id)?)
    }
}

//! Bulk mutations over a selection of tasks.
//!
//! A bulk update applies one set of field changes to many tasks in a single
//! transaction. Tasks that cannot be changed are reported individually and
//! never block the others.

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::board::TaskBoard;
use crate::error::{Error, Result};
use crate::model::{
    MilestoneId, Priority, ProjectId, ScopeMode, TaskChange, TaskId, TaskStatus,
};
use crate::state::{BoardState, OrderingGroup};
use crate::storage::BoardStore;
use crate::transition;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<MilestoneId>,
}

impl BulkUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.milestone.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    PermissionDenied,
    MilestoneInOtherProject,
    /// Subtasks always live in their parent's milestone.
    SubtaskMilestone,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::NotFound => "not found",
            FailureReason::PermissionDenied => "permission denied",
            FailureReason::MilestoneInOtherProject => "milestone belongs to another project",
            FailureReason::SubtaskMilestone => "subtasks follow their parent's milestone",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: TaskId,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkResultKind {
    NothingChanged,
    Partial,
    Complete,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    /// Distinct ids requested.
    pub requested: usize,
    pub succeeded: Vec<TaskId>,
    pub failed: Vec<BulkFailure>,
    /// One record per task whose ordering-relevant fields changed.
    pub changes: Vec<TaskChange>,
}

impl BulkOutcome {
    pub fn kind(&self) -> BulkResultKind {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (true, _) => BulkResultKind::NothingChanged,
            (false, false) => BulkResultKind::Partial,
            (false, true) => BulkResultKind::Complete,
        }
    }

    pub fn summary(&self) -> String {
        format!("updated {} of {} tasks", self.succeeded.len(), self.requested)
    }
}

fn dedupe(ids: &[TaskId]) -> Vec<TaskId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

fn check_task(
    state: &BoardState,
    id: &TaskId,
    update: &BulkUpdate,
    can_edit: &dyn Fn(&ProjectId) -> bool,
) -> std::result::Result<(), FailureReason> {
    let task = state.task(id).ok_or(FailureReason::NotFound)?;
    let project = state
        .project_of(task)
        .ok_or(FailureReason::NotFound)?;
    if !can_edit(project) {
        return Err(FailureReason::PermissionDenied);
    }
    if let Some(target) = &update.milestone {
        if target != &task.milestone {
            if task.parent.is_some() {
                return Err(FailureReason::SubtaskMilestone);
            }
            let in_project = state
                .milestone(target)
                .is_some_and(|milestone| &milestone.project == project);
            if !in_project {
                return Err(FailureReason::MilestoneInOtherProject);
            }
        }
    }
    Ok(())
}

fn apply_to_task(
    state: &mut BoardState,
    id: &TaskId,
    update: &BulkUpdate,
    mode: ScopeMode,
) -> Result<Option<TaskChange>> {
    let task = state.require_task(id)?.clone();
    let transition = transition::validate(task.status, update.status.unwrap_or(task.status));
    let milestone = update
        .milestone
        .clone()
        .unwrap_or_else(|| task.milestone.clone());
    let priority = update.priority.unwrap_or(task.priority);

    let milestone_changed = milestone != task.milestone;
    let leaves_group =
        task.parent.is_none() && (milestone_changed || transition.requires_reposition(mode));

    let mut moved = task.clone();
    moved.milestone = milestone.clone();
    moved.status = transition.target();
    let position = if leaves_group {
        state.append_position(&OrderingGroup::of(&moved, mode), Some(&task.id))
    } else {
        task.position
    };

    let before = task.state();
    let stored = state
        .task_mut(id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
    stored.milestone = milestone.clone();
    stored.status = transition.target();
    stored.priority = priority;
    stored.position = position;
    let after = stored.state();
    if after == before {
        return Ok(None);
    }
    stored.updated_at = Utc::now();

    if milestone_changed {
        state.move_descendants(id, &milestone);
    }

    Ok(Some(TaskChange {
        task: task.id,
        title: task.title,
        before,
        after,
    }))
}

impl<S: BoardStore> TaskBoard<S> {
    /// Apply `update` to every task in `ids`.
    ///
    /// Per-task problems land in [`BulkOutcome::failed`]; only whole-call
    /// errors (empty update, unknown target milestone, storage failure)
    /// are returned as `Err`.
    pub fn apply_bulk_update(&self, ids: &[TaskId], update: &BulkUpdate) -> Result<BulkOutcome> {
        if update.is_empty() {
            return Err(Error::EmptyBulkUpdate);
        }
        if ids.is_empty() {
            return Err(Error::InvalidArgument("no task ids given".to_string()));
        }
        let ids = dedupe(ids);
        let mode = self.mode();

        let outcome = self.mutate("bulk_update", |state| {
            if let Some(milestone) = &update.milestone {
                state.require_milestone(milestone)?;
            }

            let mut outcome = BulkOutcome {
                requested: ids.len(),
                ..BulkOutcome::default()
            };
            let can_edit = |project: &ProjectId| self.policy().can_edit(project);
            for id in &ids {
                if let Err(reason) = check_task(state, id, update, &can_edit) {
                    tracing::warn!(task = %id, %reason, "bulk update skipped task");
                    outcome.failed.push(BulkFailure {
                        id: id.clone(),
                        reason,
                    });
                    continue;
                }
                if let Some(change) = apply_to_task(state, id, update, mode)? {
                    outcome.changes.push(change);
                }
                outcome.succeeded.push(id.clone());
            }
            Ok(outcome)
        })?;

        tracing::info!(
            requested = outcome.requested,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk update committed"
        );
        Ok(outcome)
    }

    /// Delete every task in `ids` together with its subtasks.
    pub fn bulk_delete(&self, ids: &[TaskId]) -> Result<BulkOutcome> {
        if ids.is_empty() {
            return Err(Error::InvalidArgument("no task ids given".to_string()));
        }
        let ids = dedupe(ids);

        let outcome = self.mutate("bulk_delete", |state| {
            let mut outcome = BulkOutcome {
                requested: ids.len(),
                ..BulkOutcome::default()
            };
            let mut doomed: HashSet<TaskId> = HashSet::new();
            for id in &ids {
                let Some(task) = state.task(id) else {
                    outcome.failed.push(BulkFailure {
                        id: id.clone(),
                        reason: FailureReason::NotFound,
                    });
                    continue;
                };
                if self.ensure_can_edit(state, task).is_err() {
                    outcome.failed.push(BulkFailure {
                        id: id.clone(),
                        reason: FailureReason::PermissionDenied,
                    });
                    continue;
                }
                doomed.insert(id.clone());
                doomed.extend(state.descendants(id));
                outcome.succeeded.push(id.clone());
            }
            state.tasks.retain(|task| !doomed.contains(&task.id));
            Ok(outcome)
        })?;

        tracing::info!(
            requested = outcome.requested,
            deleted = outcome.succeeded.len(),
            "bulk delete committed"
        );
        Ok(outcome)
    }
}

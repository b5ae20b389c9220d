//! Moving and reordering tasks.
//!
//! A move places one task at an index of a destination column, possibly
//! changing its milestone and status at the same time. When the allocator
//! finds no free integer at the requested slot the destination is
//! renumbered first; both writes land in the same transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::board::TaskBoard;
use crate::error::{Error, Result};
use crate::model::{MilestoneId, Scope, ScopeMode, TaskChange, TaskId, TaskStatus};
use crate::position::{self, Placement};
use crate::state::{BoardState, OrderingGroup};
use crate::storage::BoardStore;
use crate::transition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub task: TaskId,
    /// Destination milestone; `None` keeps the current one.
    #[serde(default)]
    pub milestone: Option<MilestoneId>,
    /// Destination status; `None` keeps the current one.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Zero-based slot in the destination column. Clamped into range.
    pub index: i64,
}

impl MoveRequest {
    pub fn within(task: impl Into<TaskId>, index: i64) -> Self {
        Self {
            task: task.into(),
            milestone: None,
            status: None,
            index,
        }
    }

    pub fn to_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn to_milestone(mut self, milestone: impl Into<MilestoneId>) -> Self {
        self.milestone = Some(milestone.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub change: TaskChange,
    pub scope: Scope,
    /// Final index of the task in its destination column.
    pub index: usize,
    /// Whether the destination column was respaced to make room.
    pub renumbered: bool,
    /// Neighbours whose positions changed during the respace.
    pub respaced: Vec<TaskChange>,
    /// Destination column after the move, in display order.
    pub column: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderOutcome {
    pub order: Vec<TaskId>,
    pub changes: Vec<TaskChange>,
}

fn clamp_index(index: i64, len: usize) -> usize {
    if index <= 0 {
        0
    } else {
        (index as u64).min(len as u64) as usize
    }
}

/// Respace every task of `group` except `exclude` to `step, 2*step, ...`
/// keeping their relative order.
fn renumber_group(
    state: &mut BoardState,
    group: &OrderingGroup,
    exclude: Option<&TaskId>,
    step: u64,
) -> Result<Vec<TaskChange>> {
    let ids: Vec<TaskId> = state
        .group_tasks(group)
        .into_iter()
        .filter(|task| Some(&task.id) != exclude)
        .map(|task| task.id.clone())
        .collect();
    assign_positions(state, &ids, step)
}

fn assign_positions(
    state: &mut BoardState,
    ids: &[TaskId],
    step: u64,
) -> Result<Vec<TaskChange>> {
    let positions = position::renumbered(ids.len(), step).ok_or_else(|| {
        Error::Transaction(format!(
            "renumbering {} tasks with step {step} overflows the position range",
            ids.len()
        ))
    })?;
    let now = Utc::now();
    let mut changes = Vec::new();
    for (id, position) in ids.iter().zip(positions) {
        if let Some(task) = state.task_mut(id) {
            if task.position == position {
                continue;
            }
            let before = task.state();
            task.position = position;
            task.updated_at = now;
            changes.push(TaskChange {
                task: task.id.clone(),
                title: task.title.clone(),
                before,
                after: task.state(),
            });
        }
    }
    Ok(changes)
}

pub(crate) fn apply_move(
    state: &mut BoardState,
    request: &MoveRequest,
    mode: ScopeMode,
    step: u64,
) -> Result<MoveOutcome> {
    let task = state.require_task(&request.task)?.clone();
    if task.parent.is_some() {
        return Err(Error::InvalidArgument(format!(
            "task {} is a subtask; reorder it under its parent",
            task.id
        )));
    }

    let milestone = request
        .milestone
        .clone()
        .unwrap_or_else(|| task.milestone.clone());
    state.require_milestone(&milestone)?;

    let transition = transition::validate(task.status, request.status.unwrap_or(task.status));
    let source = Scope::of(&task, mode);
    let destination = Scope::for_mode(mode, milestone.clone(), transition.target());

    let others = state.scope_positions(&destination, Some(&task.id));
    let index = clamp_index(request.index, others.len());

    let current_index = state
        .scope_ids(&destination)
        .iter()
        .position(|id| id == &task.id);
    let keep_position = source == destination && current_index == Some(index);

    let mut renumbered = false;
    let mut respaced = Vec::new();
    let position = if keep_position {
        task.position
    } else {
        match position::compute_insert_position(&others, index) {
            Placement::At(position) => position,
            Placement::RenumberRequired => {
                tracing::debug!(scope = %destination, index, "no gap at target index, renumbering");
                respaced = renumber_group(
                    state,
                    &OrderingGroup::Scope(destination.clone()),
                    Some(&task.id),
                    step,
                )?;
                renumbered = true;
                let spaced = state.scope_positions(&destination, Some(&task.id));
                match position::compute_insert_position(&spaced, index) {
                    Placement::At(position) => position,
                    Placement::RenumberRequired => {
                        return Err(Error::Transaction(format!(
                            "no room in {destination} after renumbering"
                        )))
                    }
                }
            }
        }
    };

    let before = task.state();
    let stored = state
        .task_mut(&task.id)
        .ok_or_else(|| Error::TaskNotFound(task.id.to_string()))?;
    stored.milestone = milestone.clone();
    stored.status = transition.target();
    stored.position = position;
    if stored.state() != before {
        stored.updated_at = Utc::now();
    }
    let change = TaskChange {
        task: stored.id.clone(),
        title: stored.title.clone(),
        before,
        after: stored.state(),
    };
    if change.milestone_changed() {
        state.move_descendants(&task.id, &milestone);
    }

    let column = state.scope_ids(&destination);
    let index = column
        .iter()
        .position(|id| id == &task.id)
        .unwrap_or(index);

    Ok(MoveOutcome {
        change,
        scope: destination,
        index,
        renumbered,
        respaced,
        column,
    })
}

/// Put `ordered` first in the given order, follow with the rest of the
/// group in current order, and respace the whole group.
fn reorder_group(
    state: &mut BoardState,
    group: &OrderingGroup,
    ordered: &[TaskId],
    step: u64,
) -> Result<ReorderOutcome> {
    let current: Vec<TaskId> = state
        .group_tasks(group)
        .into_iter()
        .map(|task| task.id.clone())
        .collect();

    let mut order: Vec<TaskId> = Vec::with_capacity(current.len());
    for id in ordered {
        state.require_task(id)?;
        if !current.contains(id) {
            return Err(Error::InvalidArgument(format!("task {id} is not in {group}")));
        }
        if order.contains(id) {
            return Err(Error::InvalidArgument(format!("task {id} listed twice")));
        }
        order.push(id.clone());
    }
    for id in current {
        if !order.contains(&id) {
            order.push(id);
        }
    }

    let changes = assign_positions(state, &order, step)?;
    Ok(ReorderOutcome { order, changes })
}

impl<S: BoardStore> TaskBoard<S> {
    /// Move a task to `index` of its destination column.
    pub fn move_task(&self, request: &MoveRequest) -> Result<MoveOutcome> {
        let mode = self.mode();
        let step = self.renumber_step();
        let outcome = self.mutate("move_task", |state| {
            let task = state.require_task(&request.task)?;
            self.ensure_can_edit(state, task)?;
            if let Some(milestone) = &request.milestone {
                let target = state.require_milestone(milestone)?;
                if state.project_of(task) != Some(&target.project) {
                    return Err(Error::InvalidArgument(format!(
                        "milestone {milestone} belongs to another project"
                    )));
                }
            }
            apply_move(state, request, mode, step)
        })?;

        tracing::info!(
            task = %outcome.change.task,
            scope = %outcome.scope,
            index = outcome.index,
            position = outcome.change.after.position,
            renumbered = outcome.renumbered,
            "task moved"
        );
        Ok(outcome)
    }

    /// Reorder a column: listed tasks first, in the given order.
    pub fn reorder_scope(&self, scope: &Scope, ordered: &[TaskId]) -> Result<ReorderOutcome> {
        let step = self.renumber_step();
        let group = OrderingGroup::Scope(scope.clone());
        let outcome = self.mutate("reorder_scope", |state| {
            let milestone = state.require_milestone(&scope.milestone)?;
            if !self.policy().can_edit(&milestone.project) {
                return Err(Error::PermissionDenied(format!(
                    "cannot edit tasks of project {}",
                    milestone.project
                )));
            }
            reorder_group(state, &group, ordered, step)
        })?;
        tracing::info!(scope = %scope, changed = outcome.changes.len(), "column reordered");
        Ok(outcome)
    }

    /// Reorder the subtasks of `parent`: listed tasks first.
    pub fn reorder_subtasks(&self, parent: &TaskId, ordered: &[TaskId]) -> Result<ReorderOutcome> {
        let step = self.renumber_step();
        let group = OrderingGroup::Siblings(parent.clone());
        let outcome = self.mutate("reorder_subtasks", |state| {
            let parent_task = state.require_task(parent)?;
            self.ensure_can_edit(state, parent_task)?;
            reorder_group(state, &group, ordered, step)
        })?;
        tracing::info!(parent = %parent, changed = outcome.changes.len(), "subtasks reordered");
        Ok(outcome)
    }
}

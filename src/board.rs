//! The task board engine.
//!
//! [`TaskBoard`] ties a [`BoardStore`] to the ordering configuration and
//! owns the write discipline every mutation goes through: one transaction
//! per request, a uniqueness check on every position sequence it touched,
//! and a single retry on a position conflict.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::OrderingConfig;
use crate::error::{Error, Result};
use crate::model::{
    Milestone, MilestoneId, Priority, ProjectId, Scope, ScopeMode, Task, TaskId, TaskStatus,
    UserId,
};
use crate::state::{BoardState, OrderingGroup};
use crate::storage::BoardStore;

/// Attempts per mutation: the first try plus one retry after a conflict.
const MAX_ATTEMPTS: usize = 2;

/// Nesting limit counting the top-level task: task, subtask, sub-subtask.
pub const MAX_TASK_LEVELS: usize = 3;

/// Decides whether the current caller may edit tasks of a project.
pub trait EditPolicy {
    fn can_edit(&self, project: &ProjectId) -> bool;
}

/// Policy that allows every edit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl EditPolicy for AllowAll {
    fn can_edit(&self, _project: &ProjectId) -> bool {
        true
    }
}

/// Input for [`TaskBoard::create_task`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub milestone: MilestoneId,
    #[serde(default = "default_new_status")]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent: Option<TaskId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignees: Vec<UserId>,
}

fn default_new_status() -> TaskStatus {
    TaskStatus::Todo
}

impl NewTask {
    pub fn new(title: impl Into<String>, milestone: impl Into<MilestoneId>) -> Self {
        Self {
            title: title.into(),
            milestone: milestone.into(),
            status: default_new_status(),
            priority: Priority::None,
            description: None,
            parent: None,
            due_date: None,
            assignees: Vec::new(),
        }
    }
}

pub struct TaskBoard<S> {
    store: S,
    ordering: OrderingConfig,
    policy: Box<dyn EditPolicy + Send + Sync>,
}

impl<S: BoardStore> TaskBoard<S> {
    pub fn new(store: S, ordering: OrderingConfig) -> Self {
        Self {
            store,
            ordering,
            policy: Box::new(AllowAll),
        }
    }

    pub fn with_policy(mut self, policy: impl EditPolicy + Send + Sync + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mode(&self) -> ScopeMode {
        self.ordering.scope
    }

    pub(crate) fn renumber_step(&self) -> u64 {
        self.ordering.renumber_step.max(2)
    }

    pub(crate) fn policy(&self) -> &dyn EditPolicy {
        self.policy.as_ref()
    }

    pub(crate) fn ensure_can_edit(&self, state: &BoardState, task: &Task) -> Result<()> {
        match state.project_of(task) {
            Some(project) if self.policy.can_edit(project) => Ok(()),
            Some(project) => Err(Error::PermissionDenied(format!(
                "cannot edit tasks of project {project}"
            ))),
            None => Err(Error::MilestoneNotFound(task.milestone.to_string())),
        }
    }

    /// Build the ordering scope for a column under the configured mode.
    pub fn scope(&self, milestone: impl Into<MilestoneId>, status: Option<TaskStatus>) -> Result<Scope> {
        let milestone = milestone.into();
        match (self.mode(), status) {
            (ScopeMode::Status, Some(status)) => Ok(Scope::new(milestone, Some(status))),
            (ScopeMode::Status, None) => Err(Error::InvalidArgument(
                "a status is required when positions are scoped per status".to_string(),
            )),
            (ScopeMode::Milestone, _) => Ok(Scope::new(milestone, None)),
        }
    }

    /// Run a mutation in one transaction.
    ///
    /// The closure may run twice: a duplicate position in any touched
    /// sequence rolls the transaction back and retries once against a
    /// fresh read before the conflict is surfaced.
    pub(crate) fn mutate<T, F>(&self, operation: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut(&mut BoardState) -> Result<T>,
    {
        let mode = self.mode();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.store.transaction(|state| {
                let before = state.clone();
                let value = f(state)?;
                state.check_unique_positions(mode, &before)?;
                Ok(value)
            });

            match result {
                Err(err @ Error::ConcurrentModification { .. }) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(operation, attempt, %err, "position conflict, retrying");
                }
                other => return other,
            }
        }
    }

    pub fn add_milestone(&self, project: impl Into<ProjectId>, name: &str) -> Result<Milestone> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "milestone name cannot be empty".to_string(),
            ));
        }
        let milestone = Milestone::new(project.into(), name);
        let created = milestone.clone();
        self.mutate("add_milestone", move |state| {
            state.milestones.push(milestone.clone());
            Ok(())
        })?;
        tracing::info!(milestone = %created.id, project = %created.project, "milestone created");
        Ok(created)
    }

    pub fn milestones(&self) -> Result<Vec<Milestone>> {
        Ok(self.store.read()?.milestones)
    }

    /// Create a task at the end of its scope, or of its parent's subtasks.
    pub fn create_task(&self, request: NewTask) -> Result<Task> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
        }
        let mode = self.mode();
        let id = TaskId::generate();

        let task = self.mutate("create_task", |state| {
            let milestone = match &request.parent {
                Some(parent_id) => {
                    let parent = state.require_task(parent_id)?;
                    if state.depth(parent_id) + 1 >= MAX_TASK_LEVELS {
                        return Err(Error::InvalidArgument(format!(
                            "maximum subtask depth ({MAX_TASK_LEVELS} levels) reached under {parent_id}"
                        )));
                    }
                    parent.milestone.clone()
                }
                None => request.milestone.clone(),
            };
            state.require_milestone(&milestone)?;

            let now = Utc::now();
            let mut task = Task {
                id: id.clone(),
                title: title.clone(),
                description: request.description.clone(),
                milestone,
                parent: request.parent.clone(),
                status: request.status,
                priority: request.priority,
                position: 0,
                due_date: request.due_date,
                assignees: request.assignees.clone(),
                created_at: now,
                updated_at: now,
            };
            self.ensure_can_edit(state, &task)?;
            task.position = state.append_position(&OrderingGroup::of(&task, mode), None);
            state.tasks.push(task.clone());
            Ok(task)
        })?;

        tracing::info!(task = %task.id, position = task.position, "task created");
        Ok(task)
    }

    pub fn task(&self, id: &TaskId) -> Result<Task> {
        self.store.read()?.require_task(id).cloned()
    }

    /// Top-level tasks of a scope in position order.
    pub fn column(&self, scope: &Scope) -> Result<Vec<Task>> {
        let state = self.store.read()?;
        state.require_milestone(&scope.milestone)?;
        Ok(state.scope_tasks(scope).into_iter().cloned().collect())
    }

    /// Subtasks of a task in position order.
    pub fn subtasks(&self, parent: &TaskId) -> Result<Vec<Task>> {
        let state = self.store.read()?;
        state.require_task(parent)?;
        Ok(state.subtasks(parent).into_iter().cloned().collect())
    }
}

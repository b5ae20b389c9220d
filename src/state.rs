//! Board state snapshot and scope queries.
//!
//! A [`BoardState`] is the whole persisted board: milestones and tasks as
//! flat records. Everything the engine needs to know about ordering is
//! answered by querying it per scope.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Milestone, MilestoneId, ProjectId, Scope, ScopeMode, Task, TaskId};
use crate::position;

pub const BOARD_SCHEMA_VERSION: &str = "taskboard.board.v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardState {
    pub schema_version: String,
    /// Incremented on every committed transaction.
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::empty()
    }
}

/// A position sequence: a top-level scope or the subtasks of one parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderingGroup {
    Scope(Scope),
    Siblings(TaskId),
}

impl OrderingGroup {
    pub fn of(task: &Task, mode: ScopeMode) -> Self {
        match &task.parent {
            Some(parent) => OrderingGroup::Siblings(parent.clone()),
            None => OrderingGroup::Scope(Scope::of(task, mode)),
        }
    }

    pub fn contains(&self, task: &Task) -> bool {
        match self {
            OrderingGroup::Scope(scope) => scope.contains(task),
            OrderingGroup::Siblings(parent) => task.parent.as_ref() == Some(parent),
        }
    }
}

impl fmt::Display for OrderingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingGroup::Scope(scope) => write!(f, "scope {scope}"),
            OrderingGroup::Siblings(parent) => write!(f, "subtasks of {parent}"),
        }
    }
}

fn by_position(left: &&Task, right: &&Task) -> std::cmp::Ordering {
    left.position
        .cmp(&right.position)
        .then_with(|| left.id.cmp(&right.id))
}

impl BoardState {
    pub fn empty() -> Self {
        Self {
            schema_version: BOARD_SCHEMA_VERSION.to_string(),
            revision: 0,
            updated_at: Utc::now(),
            milestones: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn milestone(&self, id: &MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|milestone| &milestone.id == id)
    }

    pub fn require_milestone(&self, id: &MilestoneId) -> Result<&Milestone> {
        self.milestone(id)
            .ok_or_else(|| Error::MilestoneNotFound(id.to_string()))
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| &task.id == id)
    }

    pub fn require_task(&self, id: &TaskId) -> Result<&Task> {
        self.task(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    pub fn project_of(&self, task: &Task) -> Option<&ProjectId> {
        self.milestone(&task.milestone)
            .map(|milestone| &milestone.project)
    }

    /// Top-level tasks of `scope` in display order.
    pub fn scope_tasks(&self, scope: &Scope) -> Vec<&Task> {
        self.group_tasks(&OrderingGroup::Scope(scope.clone()))
    }

    /// Subtasks of `parent` in display order.
    pub fn subtasks(&self, parent: &TaskId) -> Vec<&Task> {
        self.group_tasks(&OrderingGroup::Siblings(parent.clone()))
    }

    pub fn group_tasks(&self, group: &OrderingGroup) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| group.contains(task))
            .collect();
        tasks.sort_by(by_position);
        tasks
    }

    pub fn scope_ids(&self, scope: &Scope) -> Vec<TaskId> {
        self.scope_tasks(scope)
            .into_iter()
            .map(|task| task.id.clone())
            .collect()
    }

    /// Ascending positions of a group, optionally leaving one task out.
    pub fn group_positions(&self, group: &OrderingGroup, exclude: Option<&TaskId>) -> Vec<u64> {
        self.group_tasks(group)
            .into_iter()
            .filter(|task| Some(&task.id) != exclude)
            .map(|task| task.position)
            .collect()
    }

    pub fn scope_positions(&self, scope: &Scope, exclude: Option<&TaskId>) -> Vec<u64> {
        self.group_positions(&OrderingGroup::Scope(scope.clone()), exclude)
    }

    /// Position for appending to the end of a group.
    pub fn append_position(&self, group: &OrderingGroup, exclude: Option<&TaskId>) -> u64 {
        position::next_position(&self.group_positions(group, exclude))
    }

    /// Number of ancestors above `id`; top-level tasks have depth 0.
    pub fn depth(&self, id: &TaskId) -> usize {
        let mut depth = 0;
        let mut current = self.task(id).and_then(|task| task.parent.as_ref());
        while let Some(parent) = current {
            depth += 1;
            if depth > self.tasks.len() {
                break;
            }
            current = self.task(parent).and_then(|task| task.parent.as_ref());
        }
        depth
    }

    /// Every task below `root`, at any depth.
    pub fn descendants(&self, root: &TaskId) -> Vec<TaskId> {
        let mut found = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(parent) = pending.pop() {
            for task in self
                .tasks
                .iter()
                .filter(|task| task.parent.as_ref() == Some(&parent))
            {
                found.push(task.id.clone());
                pending.push(task.id.clone());
            }
        }
        found
    }

    /// Put every descendant of `root` into `milestone`.
    pub fn move_descendants(&mut self, root: &TaskId, milestone: &MilestoneId) {
        let ids: HashSet<TaskId> = self.descendants(root).into_iter().collect();
        for task in self.tasks.iter_mut().filter(|task| ids.contains(&task.id)) {
            task.milestone = milestone.clone();
        }
    }

    /// Reject the state if a task moved since `before` now shares its
    /// position with another task of the same group. This is the
    /// storage-level uniqueness constraint on `position`.
    ///
    /// Duplicates among tasks that did not move (imported data, say) are
    /// left alone; the next renumber of that group clears them.
    pub fn check_unique_positions(&self, mode: ScopeMode, before: &BoardState) -> Result<()> {
        let previous: HashMap<&TaskId, &Task> =
            before.tasks.iter().map(|task| (&task.id, task)).collect();

        let mut moved = HashSet::new();
        let mut touched = HashSet::new();
        for task in &self.tasks {
            let group = OrderingGroup::of(task, mode);
            let unchanged = previous.get(&task.id).is_some_and(|old| {
                old.position == task.position && OrderingGroup::of(old, mode) == group
            });
            if !unchanged {
                moved.insert(&task.id);
                touched.insert(group);
            }
        }

        for group in touched {
            let mut seen: HashMap<u64, &TaskId> = HashMap::new();
            for task in self.tasks.iter().filter(|task| group.contains(task)) {
                match seen.get(&task.position) {
                    Some(other) if moved.contains(&task.id) || moved.contains(other) => {
                        return Err(Error::ConcurrentModification {
                            scope: group.to_string(),
                            position: task.position,
                        });
                    }
                    Some(_) => {
                        tracing::debug!(%group, position = task.position, "pre-existing duplicate position");
                    }
                    None => {
                        seen.insert(task.position, &task.id);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use crate::model::{Milestone, Priority, Task, TaskStatus};

    use super::BoardState;

    pub fn milestone(id: &str, project: &str) -> Milestone {
        Milestone {
            id: id.into(),
            project: project.into(),
            name: format!("Milestone {id}"),
            created_at: Utc::now(),
        }
    }

    pub fn task(id: &str, milestone: &str, status: TaskStatus, position: u64) -> Task {
        let now = Utc::now();
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: None,
            milestone: milestone.into(),
            parent: None,
            status,
            priority: Priority::None,
            position,
            due_date: None,
            assignees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn board(milestones: Vec<Milestone>, tasks: Vec<Task>) -> BoardState {
        BoardState {
            milestones,
            tasks,
            ..BoardState::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{board, milestone, task};
    use super::*;
    use crate::model::TaskStatus;

    fn sample() -> BoardState {
        let mut child = task("c1", "m1", TaskStatus::Todo, 0);
        child.parent = Some("a".into());
        board(
            vec![milestone("m1", "p1")],
            vec![
                task("b", "m1", TaskStatus::Todo, 20),
                task("a", "m1", TaskStatus::Todo, 10),
                task("x", "m1", TaskStatus::Completed, 5),
                child,
            ],
        )
    }

    #[test]
    fn scope_tasks_sorted_and_exclude_subtasks() {
        let state = sample();
        let todo = Scope::new("m1".into(), Some(TaskStatus::Todo));
        let ids: Vec<&str> = state
            .scope_tasks(&todo)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        let whole = Scope::new("m1".into(), None);
        assert_eq!(state.scope_positions(&whole, None), vec![5, 10, 20]);
        assert_eq!(
            state.scope_positions(&whole, Some(&"a".into())),
            vec![5, 20]
        );
    }

    #[test]
    fn append_position_follows_max() {
        let state = sample();
        let todo = OrderingGroup::Scope(Scope::new("m1".into(), Some(TaskStatus::Todo)));
        assert_eq!(state.append_position(&todo, None), 21);
        let empty = OrderingGroup::Scope(Scope::new("m1".into(), Some(TaskStatus::InReview)));
        assert_eq!(state.append_position(&empty, None), 0);
        let siblings = OrderingGroup::Siblings("a".into());
        assert_eq!(state.append_position(&siblings, None), 1);
    }

    #[test]
    fn duplicate_in_touched_scope_is_a_conflict() {
        let before = sample();
        let mut after = before.clone();
        after.task_mut(&"b".into()).expect("task").position = 10;

        let err = after
            .check_unique_positions(ScopeMode::Status, &before)
            .expect_err("duplicate");
        assert!(matches!(err, Error::ConcurrentModification { position: 10, .. }));
    }

    #[test]
    fn untouched_scopes_are_not_checked() {
        let mut before = sample();
        before.tasks.push(task("d", "m1", TaskStatus::Completed, 5));
        let mut after = before.clone();
        after.task_mut(&"b".into()).expect("task").position = 30;

        after
            .check_unique_positions(ScopeMode::Status, &before)
            .expect("completed column untouched");
    }

    #[test]
    fn existing_duplicates_do_not_block_other_moves() {
        let mut before = sample();
        before.tasks.push(task("d", "m1", TaskStatus::Todo, 20));
        let mut after = before.clone();
        after.tasks.push(task("e", "m1", TaskStatus::Todo, 21));

        after
            .check_unique_positions(ScopeMode::Status, &before)
            .expect("append beside an old duplicate");

        after.task_mut(&"e".into()).expect("task").position = 20;
        assert!(after
            .check_unique_positions(ScopeMode::Status, &before)
            .is_err());
    }

    #[test]
    fn depth_and_descendants_follow_parent_links() {
        let mut state = sample();
        let mut grandchild = task("g1", "m1", TaskStatus::Todo, 0);
        grandchild.parent = Some("c1".into());
        state.tasks.push(grandchild);

        assert_eq!(state.depth(&"a".into()), 0);
        assert_eq!(state.depth(&"c1".into()), 1);
        assert_eq!(state.depth(&"g1".into()), 2);

        let mut below = state.descendants(&"a".into());
        below.sort();
        assert_eq!(below, vec![TaskId::from("c1"), TaskId::from("g1")]);

        state.move_descendants(&"a".into(), &"m2".into());
        assert_eq!(state.task(&"g1".into()).expect("task").milestone.as_str(), "m2");
        assert_eq!(state.task(&"b".into()).expect("task").milestone.as_str(), "m1");
    }

    #[test]
    fn milestone_mode_spans_statuses() {
        let before = sample();
        let mut after = before.clone();
        after.task_mut(&"b".into()).expect("task").position = 5;

        assert!(after
            .check_unique_positions(ScopeMode::Status, &before)
            .is_ok());
        assert!(after
            .check_unique_positions(ScopeMode::Milestone, &before)
            .is_err());
    }
}

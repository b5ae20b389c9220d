//! Task filtering and list ordering.
//!
//! [`RawCriteria`] is the loose wire shape (comma-separated strings as they
//! arrive from a query string or CLI flags); [`FilterCriteria`] is the
//! normalized, immutable predicate. Empty dimensions never constrain.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::board::TaskBoard;
use crate::error::Result;
use crate::model::{MilestoneId, Priority, ProjectId, ScopeMode, Task, TaskStatus, UserId};
use crate::storage::BoardStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCriteria {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub due_from: Option<String>,
    #[serde(default)]
    pub due_to: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RawCriteria {
    /// Build from `key=value` pairs; unknown keys are ignored.
    pub fn from_query_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut raw = RawCriteria::default();
        for (key, value) in params {
            let slot = match key {
                "status" => &mut raw.status,
                "priority" => &mut raw.priority,
                "assignee" => &mut raw.assignee,
                "milestone" => &mut raw.milestone,
                "project" => &mut raw.project,
                "due" => &mut raw.due,
                "due_from" => &mut raw.due_from,
                "due_to" => &mut raw.due_to,
                "search" => &mut raw.search,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        raw
    }
}

/// Due-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DueFilter {
    /// Due before today and not completed.
    Overdue,
    /// Due today and not completed.
    Today,
    /// Due from today through Sunday of the current week.
    ThisWeek,
    /// Due Monday through Sunday of next week.
    NextWeek,
    NoDate,
    /// Inclusive range; at least one bound is present.
    Custom {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl DueFilter {
    fn parse(mode: &str, from: Option<&str>, to: Option<&str>) -> Option<Self> {
        match mode.trim() {
            "overdue" => Some(DueFilter::Overdue),
            "today" => Some(DueFilter::Today),
            "this_week" => Some(DueFilter::ThisWeek),
            "next_week" => Some(DueFilter::NextWeek),
            "no_date" => Some(DueFilter::NoDate),
            "custom" => {
                let from = from.and_then(parse_date);
                let to = to.and_then(parse_date);
                if from.is_none() && to.is_none() {
                    None
                } else {
                    Some(DueFilter::Custom { from, to })
                }
            }
            _ => None,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            DueFilter::Overdue => "overdue",
            DueFilter::Today => "today",
            DueFilter::ThisWeek => "this_week",
            DueFilter::NextWeek => "next_week",
            DueFilter::NoDate => "no_date",
            DueFilter::Custom { .. } => "custom",
        }
    }

    fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        let due = task.due_date;
        match self {
            DueFilter::NoDate => due.is_none(),
            DueFilter::Overdue => {
                due.is_some_and(|due| due < today) && !task.status.is_completed()
            }
            DueFilter::Today => due == Some(today) && !task.status.is_completed(),
            DueFilter::ThisWeek => {
                let (_, sunday) = week_of(today);
                due.is_some_and(|due| due >= today && due <= sunday)
            }
            DueFilter::NextWeek => {
                let (monday, _) = week_of(today);
                let start = monday + Duration::days(7);
                let end = start + Duration::days(6);
                due.is_some_and(|due| due >= start && due <= end)
            }
            DueFilter::Custom { from, to } => due.is_some_and(|due| {
                from.map_or(true, |from| due >= from) && to.map_or(true, |to| due <= to)
            }),
        }
    }
}

/// Monday and Sunday of the week containing `day`.
fn week_of(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(day.weekday().num_days_from_monday());
    let monday = day - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn tokens(raw: Option<&String>) -> impl Iterator<Item = &str> {
    raw.map(|value| value.split(','))
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn join<T: AsRef<str>>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|value| value.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub statuses: BTreeSet<TaskStatus>,
    pub priorities: BTreeSet<Priority>,
    pub assignees: BTreeSet<UserId>,
    pub milestones: BTreeSet<MilestoneId>,
    pub projects: BTreeSet<ProjectId>,
    pub due: Option<DueFilter>,
    pub search: Option<String>,
}

impl FilterCriteria {
    /// Normalize raw criteria. Unknown status, priority and due tokens are
    /// dropped rather than rejected.
    pub fn parse(raw: &RawCriteria) -> Self {
        let due = raw.due.as_deref().and_then(|mode| {
            DueFilter::parse(mode, raw.due_from.as_deref(), raw.due_to.as_deref())
        });
        let search = raw
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_string);

        Self {
            statuses: tokens(raw.status.as_ref())
                .filter_map(TaskStatus::parse)
                .collect(),
            priorities: tokens(raw.priority.as_ref())
                .filter_map(Priority::parse)
                .collect(),
            assignees: tokens(raw.assignee.as_ref()).map(UserId::from).collect(),
            milestones: tokens(raw.milestone.as_ref())
                .map(MilestoneId::from)
                .collect(),
            projects: tokens(raw.project.as_ref()).map(ProjectId::from).collect(),
            due,
            search,
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Number of constrained dimensions.
    pub fn active_filter_count(&self) -> usize {
        [
            !self.statuses.is_empty(),
            !self.priorities.is_empty(),
            !self.assignees.is_empty(),
            !self.milestones.is_empty(),
            self.due.is_some(),
            self.search.is_some(),
            !self.projects.is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// `project` is the project owning the task's milestone.
    pub fn matches(&self, task: &Task, project: Option<&ProjectId>, today: NaiveDate) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if !self.assignees.is_empty()
            && !task
                .assignees
                .iter()
                .any(|user| self.assignees.contains(user))
        {
            return false;
        }
        if !self.milestones.is_empty() && !self.milestones.contains(&task.milestone) {
            return false;
        }
        if !self.projects.is_empty()
            && !project.is_some_and(|project| self.projects.contains(project))
        {
            return false;
        }
        if let Some(due) = &self.due {
            if !due.matches(task, today) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Canonical query parameters; parsing them again yields equal criteria.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.statuses.is_empty() {
            params.push(("status", join(self.statuses.iter().map(|s| s.as_str()))));
        }
        if !self.priorities.is_empty() {
            params.push(("priority", join(self.priorities.iter().map(|p| p.as_str()))));
        }
        if !self.assignees.is_empty() {
            params.push(("assignee", join(self.assignees.iter().map(UserId::as_str))));
        }
        if !self.milestones.is_empty() {
            params.push((
                "milestone",
                join(self.milestones.iter().map(MilestoneId::as_str)),
            ));
        }
        if let Some(due) = &self.due {
            params.push(("due", due.mode().to_string()));
            if let DueFilter::Custom { from, to } = due {
                if let Some(from) = from {
                    params.push(("due_from", from.format(DATE_FORMAT).to_string()));
                }
                if let Some(to) = to {
                    params.push(("due_to", to.format(DATE_FORMAT).to_string()));
                }
            }
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if !self.projects.is_empty() {
            params.push(("project", join(self.projects.iter().map(ProjectId::as_str))));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    /// Due date ascending (undated last), then priority descending.
    #[default]
    Default,
    /// Column order.
    Position,
}

fn default_order(left: &Task, right: &Task) -> Ordering {
    let due = match (left.due_date, right.due_date) {
        (Some(l), Some(r)) => l.cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    due.then_with(|| right.priority.cmp(&left.priority))
        .then_with(|| left.id.cmp(&right.id))
}

pub fn sort_default(tasks: &mut [Task]) {
    tasks.sort_by(default_order);
}

/// Sort by column: milestone, then status when scoped per status, then
/// position.
pub fn sort_by_position(tasks: &mut [Task], mode: ScopeMode) {
    tasks.sort_by(|left, right| {
        let status = match mode {
            ScopeMode::Status => left.status.cmp(&right.status),
            ScopeMode::Milestone => Ordering::Equal,
        };
        left.milestone
            .cmp(&right.milestone)
            .then(status)
            .then_with(|| left.position.cmp(&right.position))
            .then_with(|| left.id.cmp(&right.id))
    });
}

impl<S: BoardStore> TaskBoard<S> {
    /// Top-level tasks matching `criteria`, in `sort` order.
    pub fn list(&self, criteria: &FilterCriteria, sort: TaskSort, today: NaiveDate) -> Result<Vec<Task>> {
        let state = self.store().read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| task.parent.is_none())
            .filter(|task| criteria.matches(task, state.project_of(task), today))
            .cloned()
            .collect();

        match sort {
            TaskSort::Default => sort_default(&mut tasks),
            TaskSort::Position => sort_by_position(&mut tasks, self.mode()),
        }
        tracing::debug!(
            filters = criteria.active_filter_count(),
            matched = tasks.len(),
            "listed tasks"
        );
        Ok(tasks)
    }
}

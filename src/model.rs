//! Task, milestone and ordering-scope records.
//!
//! These are plain data records; relations between them (milestone to
//! tasks, parent to subtasks) are resolved by explicit scope queries in
//! [`crate::state::BoardState`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Task identifier. Generated ids are ULIDs, so they sort by creation.
    TaskId
);
string_id!(MilestoneId);
string_id!(ProjectId);
string_id!(UserId);

impl TaskId {
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }
}

impl MilestoneId {
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
    }

    pub fn is_completed(self) -> bool {
        self == TaskStatus::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "unknown status '{s}' (expected todo|in_progress|in_review|completed)"
            ))
        })
    }
}

/// Task priority, ordered `None < Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::None,
        Priority::Low,
        Priority::Medium,
        Priority::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(trimmed))
    }

    /// Map a value from the retired five-level scheme. Every level moved
    /// down one rank when `urgent` was removed and `none` introduced.
    pub fn from_legacy(legacy: LegacyPriority) -> Self {
        match legacy {
            LegacyPriority::Urgent => Priority::High,
            LegacyPriority::High => Priority::Medium,
            LegacyPriority::Medium => Priority::Low,
            LegacyPriority::Low => Priority::None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "unknown priority '{s}' (expected none|low|medium|high)"
            ))
        })
    }
}

/// Priority values found in backups taken before the priority migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl LegacyPriority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "urgent" => Some(LegacyPriority::Urgent),
            "high" => Some(LegacyPriority::High),
            "medium" => Some(LegacyPriority::Medium),
            "low" => Some(LegacyPriority::Low),
            _ => None,
        }
    }
}

/// Which grouping defines the position scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    /// Kanban: positions are unique per (milestone, status).
    #[default]
    Status,
    /// List/table: positions are unique per milestone.
    Milestone,
}

/// A set of top-level tasks sharing one position sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub milestone: MilestoneId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl Scope {
    pub fn new(milestone: MilestoneId, status: Option<TaskStatus>) -> Self {
        Self { milestone, status }
    }

    /// Build a scope for `mode`, dropping the status in milestone mode.
    pub fn for_mode(mode: ScopeMode, milestone: MilestoneId, status: TaskStatus) -> Self {
        match mode {
            ScopeMode::Status => Self::new(milestone, Some(status)),
            ScopeMode::Milestone => Self::new(milestone, None),
        }
    }

    /// The scope a top-level task currently sits in.
    pub fn of(task: &Task, mode: ScopeMode) -> Self {
        Self::for_mode(mode, task.milestone.clone(), task.status)
    }

    pub fn contains(&self, task: &Task) -> bool {
        task.parent.is_none()
            && task.milestone == self.milestone
            && self.status.map_or(true, |status| status == task.status)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}/{}", self.milestone, status),
            None => write!(f, "{}", self.milestone),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub project: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Milestone {
    pub fn new(project: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: MilestoneId::generate(),
            project,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub milestone: MilestoneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub position: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn state(&self) -> TaskState {
        TaskState {
            milestone: self.milestone.clone(),
            status: self.status,
            priority: self.priority,
            position: self.position,
        }
    }
}

/// The ordering-relevant fields of a task at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub milestone: MilestoneId,
    pub status: TaskStatus,
    pub priority: Priority,
    pub position: u64,
}

/// Before/after record of one committed task mutation, handed to the
/// activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChange {
    pub task: TaskId,
    pub title: String,
    pub before: TaskState,
    pub after: TaskState,
}

impl TaskChange {
    pub fn status_changed(&self) -> bool {
        self.before.status != self.after.status
    }

    pub fn priority_changed(&self) -> bool {
        self.before.priority != self.after.priority
    }

    pub fn milestone_changed(&self) -> bool {
        self.before.milestone != self.after.milestone
    }

    pub fn position_changed(&self) -> bool {
        self.before.position != self.after.position
    }

    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

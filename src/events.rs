//! Event output for external integrations.
//!
//! Committed task changes are emitted as JSON lines to stdout or a
//! configured file, so an activity log can be built outside the engine.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Milestone, Task, TaskChange, TaskId};

pub const EVENT_SCHEMA_VERSION: &str = "taskboard.event.v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(EventDestination::Stdout);
            }
            Some(EventDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<EventSink> {
        match self {
            EventDestination::Stdout => Ok(EventSink::stdout()),
            EventDestination::File(path) => EventSink::file(path),
        }
    }
}

/// High-level event kinds emitted by taskboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MilestoneCreated,
    TaskCreated,
    TaskStatusChanged,
    TaskReordered,
    TaskPriorityChanged,
    TaskMilestoneChanged,
    TaskDeleted,
}

/// A structured event with optional payload.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub schema_version: &'static str,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Event {
    pub fn new(event: EventKind, actor: Option<String>) -> Self {
        Self {
            schema_version: EVENT_SCHEMA_VERSION,
            event,
            timestamp: Utc::now(),
            actor,
            data: None,
        }
    }

    /// Attach a serializable payload to the event.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Result<Self> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }
}

/// Events describing one committed change, in a fixed order: status,
/// milestone, priority, then position.
pub fn events_for_change(change: &TaskChange, actor: Option<&str>) -> Result<Vec<Event>> {
    let actor = actor.map(str::to_string);
    let mut events = Vec::new();
    let base = serde_json::json!({ "task": change.task, "title": change.title });
    let payload = |from: serde_json::Value, to: serde_json::Value| {
        let mut data = base.clone();
        data["from"] = from;
        data["to"] = to;
        data
    };

    if change.status_changed() {
        events.push(Event::new(EventKind::TaskStatusChanged, actor.clone()).with_data(payload(
            serde_json::json!(change.before.status),
            serde_json::json!(change.after.status),
        ))?);
    }
    if change.milestone_changed() {
        events.push(Event::new(EventKind::TaskMilestoneChanged, actor.clone()).with_data(
            payload(
                serde_json::json!(change.before.milestone),
                serde_json::json!(change.after.milestone),
            ),
        )?);
    }
    if change.priority_changed() {
        events.push(Event::new(EventKind::TaskPriorityChanged, actor.clone()).with_data(
            payload(
                serde_json::json!(change.before.priority),
                serde_json::json!(change.after.priority),
            ),
        )?);
    }
    if change.position_changed() {
        events.push(Event::new(EventKind::TaskReordered, actor).with_data(payload(
            serde_json::json!(change.before.position),
            serde_json::json!(change.after.position),
        ))?);
    }
    Ok(events)
}

pub fn task_created(task: &Task, actor: Option<&str>) -> Result<Event> {
    Event::new(EventKind::TaskCreated, actor.map(str::to_string)).with_data(serde_json::json!({
        "task": task.id,
        "title": task.title,
        "milestone": task.milestone,
        "status": task.status,
        "position": task.position,
    }))
}

pub fn task_deleted(task: &TaskId, actor: Option<&str>) -> Result<Event> {
    Event::new(EventKind::TaskDeleted, actor.map(str::to_string))
        .with_data(serde_json::json!({ "task": task }))
}

pub fn milestone_created(milestone: &Milestone, actor: Option<&str>) -> Result<Event> {
    Event::new(EventKind::MilestoneCreated, actor.map(str::to_string)).with_data(milestone)
}

/// Event sink that writes JSONL output to a destination.
pub struct EventSink {
    writer: Box<dyn Write + Send>,
}

impl EventSink {
    /// Emit events to stdout.
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Emit events to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Box::new(file),
        })
    }

    /// Write a single event as JSONL.
    pub fn emit(&mut self, event: &Event) -> Result<()> {
        let serialized = serde_json::to_vec(event)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        Ok(())
    }

    pub fn emit_all(&mut self, events: &[Event]) -> Result<()> {
        events.iter().try_for_each(|event| self.emit(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskState, TaskStatus};
    use tempfile::TempDir;

    fn change(before: TaskState, after: TaskState) -> TaskChange {
        TaskChange {
            task: "t1".into(),
            title: "Write docs".to_string(),
            before,
            after,
        }
    }

    fn state(status: TaskStatus, position: u64) -> TaskState {
        TaskState {
            milestone: "m1".into(),
            status,
            priority: Priority::None,
            position,
        }
    }

    #[test]
    fn destination_parse() {
        assert_eq!(EventDestination::parse(None), None);
        assert_eq!(EventDestination::parse(Some("  ")), None);
        assert_eq!(
            EventDestination::parse(Some("-")),
            Some(EventDestination::Stdout)
        );
        assert_eq!(
            EventDestination::parse(Some("events.jsonl")),
            Some(EventDestination::File(PathBuf::from("events.jsonl")))
        );
    }

    #[test]
    fn cross_column_move_reports_status_and_reorder() {
        let moved = change(state(TaskStatus::Todo, 3), state(TaskStatus::InReview, 0));
        let kinds: Vec<EventKind> = events_for_change(&moved, Some("alice"))
            .unwrap()
            .into_iter()
            .map(|event| event.event)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::TaskStatusChanged, EventKind::TaskReordered]
        );
    }

    #[test]
    fn noop_change_emits_nothing() {
        let same = change(state(TaskStatus::Todo, 3), state(TaskStatus::Todo, 3));
        assert!(events_for_change(&same, None).unwrap().is_empty());
    }

    #[test]
    fn file_sink_appends_jsonl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("events.jsonl");
        let moved = change(state(TaskStatus::Todo, 3), state(TaskStatus::Completed, 9));

        let mut sink = EventSink::file(&path).unwrap();
        sink.emit_all(&events_for_change(&moved, Some("alice")).unwrap())
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "task_status_changed");
        assert_eq!(lines[0]["actor"], "alice");
        assert_eq!(lines[0]["data"]["from"], "todo");
        assert_eq!(lines[0]["data"]["to"], "completed");
        assert_eq!(lines[1]["data"]["to"], 9);
    }
}

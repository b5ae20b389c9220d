//! taskboard task command implementations.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::board::NewTask;
use crate::bulk::{BulkOutcome, BulkUpdate};
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::filter::{FilterCriteria, RawCriteria, TaskSort};
use crate::model::{MilestoneId, Priority, Scope, Task, TaskChange, TaskId, TaskStatus, UserId};
use crate::output::{emit_success, Report};
use crate::reorder::MoveRequest;

use super::{emit_events, load_context, open_event_sink, Common};

pub struct AddOptions {
    pub title: String,
    pub milestone: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub parent: Option<String>,
    pub due: Option<String>,
    pub description: Option<String>,
    pub assignees: Vec<String>,
    pub common: Common,
}

pub struct MoveOptions {
    pub id: String,
    pub index: i64,
    pub milestone: Option<String>,
    pub status: Option<String>,
    pub common: Common,
}

pub struct ReorderOptions {
    pub ids: Vec<String>,
    pub milestone: Option<String>,
    pub status: Option<String>,
    pub parent: Option<String>,
    pub common: Common,
}

pub struct BulkOptions {
    pub ids: Vec<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub milestone: Option<String>,
    pub common: Common,
}

pub struct DeleteOptions {
    pub ids: Vec<String>,
    pub common: Common,
}

pub struct ListOptions {
    pub criteria: RawCriteria,
    pub sort: String,
    pub today: Option<String>,
    pub common: Common,
}

pub struct ColumnOptions {
    pub milestone: String,
    pub status: Option<String>,
    pub common: Common,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    active_filters: usize,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct ColumnOutput {
    scope: Scope,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct ReorderOutput {
    order: Vec<TaskId>,
    changes: Vec<TaskChange>,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), common.actor.clone())?;
    let (mut sink, events_to_stdout) = open_event_sink(common.events.as_deref())?;

    let parent = non_empty(options.parent).map(TaskId::from);
    let milestone = match (non_empty(options.milestone), &parent) {
        (Some(milestone), _) => MilestoneId::from(milestone),
        (None, Some(parent)) => ctx.board.task(parent)?.milestone,
        (None, None) => {
            return Err(Error::InvalidArgument(
                "--milestone is required for top-level tasks".to_string(),
            ))
        }
    };

    let mut request = NewTask::new(options.title, milestone);
    request.parent = parent;
    request.description = non_empty(options.description);
    request.due_date = options.due.as_deref().map(parse_date).transpose()?;
    request.assignees = options
        .assignees
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(UserId::from)
        .collect();
    if let Some(status) = options.status.as_deref() {
        request.status = status.parse()?;
    }
    if let Some(priority) = options.priority.as_deref() {
        request.priority = priority.parse()?;
    }

    let task = ctx.board.create_task(request)?;
    let warning = emit_events(
        &mut sink,
        events::task_created(&task, ctx.actor.as_deref()).map(|event| vec![event]),
    );

    let mut report = Report::new("Task created");
    if let Some(warning) = warning {
        report.warn(warning);
    }
    push_task_summary(&mut report, &task);

    emit_success(
        common.output(events_to_stdout),
        "task add",
        &task,
        &report,
    )
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), common.actor.clone())?;
    let (mut sink, events_to_stdout) = open_event_sink(common.events.as_deref())?;

    let request = MoveRequest {
        task: TaskId::from(options.id.trim()),
        milestone: non_empty(options.milestone).map(MilestoneId::from),
        status: options
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        index: options.index,
    };
    let outcome = ctx.board.move_task(&request)?;
    let actor = ctx.actor.as_deref();
    let warning = emit_events(
        &mut sink,
        events::events_for_change(&outcome.change, actor).and_then(|mut events| {
            events.extend(change_events(&outcome.respaced, actor)?);
            Ok(events)
        }),
    );

    let mut report = Report::new(if outcome.change.is_noop() {
        "Task already in place"
    } else {
        "Task moved"
    });
    if let Some(warning) = warning {
        report.warn(warning);
    }
    report.field("Task", outcome.change.task.to_string());
    report.field("Column", outcome.scope.to_string());
    report.field("Index", outcome.index.to_string());
    if outcome.change.status_changed() {
        report.field(
            "Status",
            format!(
                "{} -> {}",
                outcome.change.before.status, outcome.change.after.status
            ),
        );
    }
    if outcome.renumbered {
        report.field("Renumbered", format!("{} neighbours respaced", outcome.respaced.len()));
    }

    emit_success(
        common.output(events_to_stdout),
        "task move",
        &outcome,
        &report,
    )
}

pub fn run_reorder(options: ReorderOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), common.actor.clone())?;
    let (mut sink, events_to_stdout) = open_event_sink(common.events.as_deref())?;
    let ids = task_ids(&options.ids)?;

    let (label, outcome) = match non_empty(options.parent) {
        Some(parent) => {
            let parent = TaskId::from(parent);
            let outcome = ctx.board.reorder_subtasks(&parent, &ids)?;
            (format!("subtasks of {parent}"), outcome)
        }
        None => {
            let milestone = non_empty(options.milestone).ok_or_else(|| {
                Error::InvalidArgument("--milestone or --parent is required".to_string())
            })?;
            let status = options
                .status
                .as_deref()
                .map(str::parse::<TaskStatus>)
                .transpose()?;
            let scope = ctx.board.scope(milestone, status)?;
            let outcome = ctx.board.reorder_scope(&scope, &ids)?;
            (scope.to_string(), outcome)
        }
    };

    let warning = emit_events(&mut sink, change_events(&outcome.changes, ctx.actor.as_deref()));

    let mut report = Report::new("Tasks reordered");
    if let Some(warning) = warning {
        report.warn(warning);
    }
    report.field("Column", label);
    report.field("Changed", outcome.changes.len().to_string());
    for (index, id) in outcome.order.iter().enumerate() {
        report.row(format!("{index}: {id}"));
    }

    let output = ReorderOutput {
        order: outcome.order,
        changes: outcome.changes,
    };
    emit_success(
        common.output(events_to_stdout),
        "task reorder",
        &output,
        &report,
    )
}

pub fn run_bulk(options: BulkOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), common.actor.clone())?;
    let (mut sink, events_to_stdout) = open_event_sink(common.events.as_deref())?;

    let update = BulkUpdate {
        status: options
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        priority: options
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        milestone: non_empty(options.milestone).map(MilestoneId::from),
    };
    let ids = task_ids(&options.ids)?;
    let outcome = ctx.board.apply_bulk_update(&ids, &update)?;
    let warning = emit_events(&mut sink, change_events(&outcome.changes, ctx.actor.as_deref()));

    let report = bulk_report("Bulk update", &outcome, warning);
    emit_success(
        common.output(events_to_stdout),
        "task bulk",
        &outcome,
        &report,
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), common.actor.clone())?;
    let (mut sink, events_to_stdout) = open_event_sink(common.events.as_deref())?;

    let ids = task_ids(&options.ids)?;
    let outcome = ctx.board.bulk_delete(&ids)?;
    let actor = ctx.actor.as_deref();
    let warning = emit_events(
        &mut sink,
        outcome
            .succeeded
            .iter()
            .map(|id| events::task_deleted(id, actor))
            .collect(),
    );

    let report = bulk_report("Bulk delete", &outcome, warning);
    emit_success(
        common.output(events_to_stdout),
        "task delete",
        &outcome,
        &report,
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), None)?;
    let criteria = FilterCriteria::parse(&options.criteria);
    let sort = parse_sort(&options.sort)?;
    let today = match options.today.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };

    let tasks = ctx.board.list(&criteria, sort, today)?;

    let mut report = Report::new("Tasks");
    report.field("Total", tasks.len().to_string());
    if criteria.has_active_filters() {
        let filters = criteria
            .to_query_params()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        report.field("Filters", filters);
    }
    for task in &tasks {
        report.row(task_line(task));
    }

    let output = TaskListOutput {
        total: tasks.len(),
        active_filters: criteria.active_filter_count(),
        tasks,
    };
    emit_success(common.output(false), "task list", &output, &report)
}

pub fn run_column(options: ColumnOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), None)?;
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let scope = ctx.board.scope(options.milestone.trim(), status)?;
    let tasks = ctx.board.column(&scope)?;

    let mut report = Report::new(format!("Column {scope}"));
    report.field("Total", tasks.len().to_string());
    for (index, task) in tasks.iter().enumerate() {
        report.row(format!("{index}: {}", task_line(task)));
    }

    let output = ColumnOutput { scope, tasks };
    emit_success(common.output(false), "task column", &output, &report)
}

fn bulk_report(title: &str, outcome: &BulkOutcome, warning: Option<String>) -> Report {
    let mut report = Report::new(title);
    report.bulk(outcome);
    if let Some(warning) = warning {
        report.warn(warning);
    }
    report
}

fn change_events(changes: &[TaskChange], actor: Option<&str>) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for change in changes {
        events.extend(events::events_for_change(change, actor)?);
    }
    Ok(events)
}

fn push_task_summary(report: &mut Report, task: &Task) {
    report.field("ID", task.id.to_string());
    report.field("Title", task.title.clone());
    report.field("Milestone", task.milestone.to_string());
    report.field("Status", task.status.to_string());
    report.field("Priority", task.priority.to_string());
    report.field("Position", task.position.to_string());
    if let Some(parent) = task.parent.as_ref() {
        report.field("Parent", parent.to_string());
    }
    if let Some(due) = task.due_date {
        report.field("Due", due.to_string());
    }
    if let Some(description) = task.description.as_ref() {
        report.row(description.clone());
    }
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "[{}][{}] {} {}",
        task.status, task.priority, task.id, task.title
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due: {due})"));
    }
    line
}

fn task_ids(raw: &[String]) -> Result<Vec<TaskId>> {
    let ids: Vec<TaskId> = raw
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(TaskId::from)
        .collect();
    if ids.is_empty() {
        return Err(Error::InvalidArgument("no task ids given".to_string()));
    }
    Ok(ids)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid date '{raw}' (expected YYYY-MM-DD)"))
    })
}

fn parse_sort(raw: &str) -> Result<TaskSort> {
    match raw.trim() {
        "default" => Ok(TaskSort::Default),
        "position" => Ok(TaskSort::Position),
        other => Err(Error::InvalidArgument(format!(
            "unknown sort '{other}' (expected default|position)"
        ))),
    }
}

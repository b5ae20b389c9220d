//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::board::TaskBoard;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{Event, EventDestination, EventSink};
use crate::output::OutputOptions;
use crate::storage::FileStore;

mod init;
mod milestone;
mod task;

/// taskboard - task ordering and bulk mutation for milestone boards
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Board root holding `.taskboard.toml` (defaults to current directory)
    #[arg(long, global = true, env = "TASKBOARD_ROOT")]
    pub root: Option<PathBuf>,

    /// Actor recorded on emitted events
    #[arg(long, global = true, env = "TASKBOARD_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit change events as JSONL to a file, or `-` for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create `.taskboard.toml` and an empty board
    Init {
        /// Position scope: status (kanban) or milestone (list)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Milestone management
    #[command(subcommand)]
    Milestone(MilestoneCommands),

    /// Task ordering and bulk edits
    #[command(subcommand)]
    Task(TaskCommands),
}

/// Milestone subcommands
#[derive(Subcommand, Debug)]
pub enum MilestoneCommands {
    /// Add a milestone to a project
    Add {
        /// Owning project id
        project: String,

        /// Milestone name
        name: String,
    },

    /// List milestones
    List {
        /// Only milestones of this project
        #[arg(long)]
        project: Option<String>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task at the end of its column
    Add {
        /// Task title
        title: String,

        /// Milestone id (ignored for subtasks)
        #[arg(short, long)]
        milestone: Option<String>,

        /// Initial status: todo, in_progress, in_review, completed
        #[arg(short, long)]
        status: Option<String>,

        /// Priority: none, low, medium, high
        #[arg(short, long)]
        priority: Option<String>,

        /// Parent task id; makes this a subtask
        #[arg(long)]
        parent: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Assignee user ids
        #[arg(long = "assignee")]
        assignees: Vec<String>,
    },

    /// Move a task to an index of a column
    Move {
        /// Task id
        id: String,

        /// Zero-based target index; out-of-range values are clamped
        #[arg(long, allow_hyphen_values = true)]
        index: i64,

        /// Destination milestone (default: current)
        #[arg(short, long)]
        milestone: Option<String>,

        /// Destination status (default: current)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Reorder a column, or a parent's subtasks, listed ids first
    Reorder {
        /// Task ids in their new order
        #[arg(required = true)]
        ids: Vec<String>,

        /// Column milestone
        #[arg(short, long, conflicts_with = "parent")]
        milestone: Option<String>,

        /// Column status (required when positions are scoped per status)
        #[arg(short, long, conflicts_with = "parent")]
        status: Option<String>,

        /// Reorder the subtasks of this task instead of a column
        #[arg(long)]
        parent: Option<String>,
    },

    /// Apply status, priority or milestone to many tasks
    Bulk {
        /// Task ids
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        milestone: Option<String>,
    },

    /// Delete tasks and their subtasks
    Delete {
        /// Task ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List tasks matching filters
    List {
        /// Comma-separated statuses
        #[arg(long)]
        status: Option<String>,

        /// Comma-separated priorities
        #[arg(long)]
        priority: Option<String>,

        /// Comma-separated assignee ids
        #[arg(long)]
        assignee: Option<String>,

        /// Comma-separated milestone ids
        #[arg(long)]
        milestone: Option<String>,

        /// Comma-separated project ids
        #[arg(long)]
        project: Option<String>,

        /// Due window: overdue, today, this_week, next_week, no_date, custom
        #[arg(long)]
        due: Option<String>,

        /// Start of a custom due window (YYYY-MM-DD)
        #[arg(long)]
        due_from: Option<String>,

        /// End of a custom due window (YYYY-MM-DD)
        #[arg(long)]
        due_to: Option<String>,

        /// Case-insensitive text in title or description
        #[arg(long)]
        search: Option<String>,

        /// Sort order: default (due date, priority) or position
        #[arg(long, default_value = "default")]
        sort: String,

        /// Reference date for due windows (default: today)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show one column in position order
    Column {
        #[arg(short, long)]
        milestone: String,

        /// Column status (required when positions are scoped per status)
        #[arg(short, long)]
        status: Option<String>,
    },
}

impl Commands {
    /// Command path reported in output envelopes, e.g. `task move`.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "init",
            Commands::Milestone(MilestoneCommands::Add { .. }) => "milestone add",
            Commands::Milestone(MilestoneCommands::List { .. }) => "milestone list",
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add { .. } => "task add",
                TaskCommands::Move { .. } => "task move",
                TaskCommands::Reorder { .. } => "task reorder",
                TaskCommands::Bulk { .. } => "task bulk",
                TaskCommands::Delete { .. } => "task delete",
                TaskCommands::List { .. } => "task list",
                TaskCommands::Column { .. } => "task column",
            },
        }
    }
}

/// Global flags every command receives.
pub(crate) struct Common {
    pub root: Option<PathBuf>,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Common {
    /// Output options; stdout events take over stdout, so human and JSON
    /// output are silenced.
    pub fn output(&self, events_to_stdout: bool) -> OutputOptions {
        OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet || events_to_stdout,
        }
    }
}

/// Board handle shared by the milestone and task commands.
pub(crate) struct BoardContext {
    pub board: TaskBoard<FileStore>,
    pub actor: Option<String>,
}

pub(crate) fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

pub(crate) fn load_context(root: Option<PathBuf>, actor: Option<String>) -> Result<BoardContext> {
    let root = resolve_root(root)?;
    let config = Config::load_from_dir(&root);
    let store = FileStore::new(config.storage_dir(&root))
        .with_lock_timeout(config.storage.lock_timeout_ms);
    if !store.is_initialized() {
        return Err(Error::NotInitialized(store.dir().to_path_buf()));
    }

    let actor = actor
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    Ok(BoardContext {
        board: TaskBoard::new(store, config.ordering),
        actor,
    })
}

pub(crate) fn open_event_sink(events: Option<&str>) -> Result<(Option<EventSink>, bool)> {
    let destination = EventDestination::parse(events);
    let sink = destination.as_ref().map(|dest| dest.open()).transpose()?;
    let events_to_stdout = matches!(destination, Some(EventDestination::Stdout));
    Ok((sink, events_to_stdout))
}

/// Emit events, returning a warning instead of failing the command.
pub(crate) fn emit_events(sink: &mut Option<EventSink>, events: Result<Vec<Event>>) -> Option<String> {
    let sink = sink.as_mut()?;
    let result = events.and_then(|events| sink.emit_all(&events));
    result.err().map(|err| format!("event output failed: {err}"))
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let common = Common {
            root: self.root,
            actor: self.actor,
            events: self.events,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init { scope } => init::run(init::InitOptions {
                scope,
                root: common.root,
                json: common.json,
                quiet: common.quiet,
            }),
            Commands::Milestone(cmd) => match cmd {
                MilestoneCommands::Add { project, name } => {
                    milestone::run_add(milestone::AddOptions {
                        project,
                        name,
                        common,
                    })
                }
                MilestoneCommands::List { project } => {
                    milestone::run_list(milestone::ListOptions { project, common })
                }
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    milestone,
                    status,
                    priority,
                    parent,
                    due,
                    description,
                    assignees,
                } => task::run_add(task::AddOptions {
                    title,
                    milestone,
                    status,
                    priority,
                    parent,
                    due,
                    description,
                    assignees,
                    common,
                }),
                TaskCommands::Move {
                    id,
                    index,
                    milestone,
                    status,
                } => task::run_move(task::MoveOptions {
                    id,
                    index,
                    milestone,
                    status,
                    common,
                }),
                TaskCommands::Reorder {
                    ids,
                    milestone,
                    status,
                    parent,
                } => task::run_reorder(task::ReorderOptions {
                    ids,
                    milestone,
                    status,
                    parent,
                    common,
                }),
                TaskCommands::Bulk {
                    ids,
                    status,
                    priority,
                    milestone,
                } => task::run_bulk(task::BulkOptions {
                    ids,
                    status,
                    priority,
                    milestone,
                    common,
                }),
                TaskCommands::Delete { ids } => {
                    task::run_delete(task::DeleteOptions { ids, common })
                }
                TaskCommands::List {
                    status,
                    priority,
                    assignee,
                    milestone,
                    project,
                    due,
                    due_from,
                    due_to,
                    search,
                    sort,
                    today,
                } => task::run_list(task::ListOptions {
                    criteria: crate::filter::RawCriteria {
                        status,
                        priority,
                        assignee,
                        milestone,
                        project,
                        due,
                        due_from,
                        due_to,
                        search,
                    },
                    sort,
                    today,
                    common,
                }),
                TaskCommands::Column { milestone, status } => {
                    task::run_column(task::ColumnOptions {
                        milestone,
                        status,
                        common,
                    })
                }
            },
        }
    }
}

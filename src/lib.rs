//! taskboard - Task Ordering & Bulk Mutation Library
//!
//! Tasks live in milestones and carry an integer `position` that defines
//! their display order within a scope. This library keeps those positions
//! consistent under moves, reorders, status changes and bulk edits.
//!
//! # Core Concepts
//!
//! - **Scope**: the `(milestone, status)` or `(milestone)` grouping in which
//!   positions are unique, selected by [`model::ScopeMode`]
//! - **Placement**: the allocator's answer for an insert, a free position or
//!   a request to renumber the scope first
//! - **Bulk mutation**: one field change applied to many tasks with per-task
//!   failures reported alongside the successes
//! - **TaskChange**: before/after record of every committed change, handed
//!   to the activity log through [`events`]
//!
//! # Module Organization
//!
//! - `board`: the [`board::TaskBoard`] engine and its write discipline
//! - `position`: position allocation and renumbering
//! - `reorder`: moves and column reorders
//! - `filter`: filter criteria and list ordering
//! - `bulk`: bulk updates and deletes
//! - `transition`: status transition classification
//! - `optimistic`: client-side column with optimistic moves
//! - `state`: board snapshot and scope queries
//! - `storage`: transactional stores (file-backed and in-memory)
//! - `lock`: file locking and atomic writes
//! - `config`: configuration loading from `.taskboard.toml`
//! - `events`: JSONL change events
//! - `cli` / `output`: command-line interface and output formatting

pub mod board;
pub mod bulk;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod lock;
pub mod model;
pub mod optimistic;
pub mod output;
pub mod position;
pub mod reorder;
pub mod state;
pub mod storage;
pub mod transition;

pub use error::{Error, Result};

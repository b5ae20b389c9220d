//! Command output: a versioned JSON envelope, or a plain-text report.
//!
//! Every command builds one [`Report`] for people and hands its typed
//! result to [`emit_success`] for machines. Bulk commands render their
//! per-task failures in a section of their own.

use std::fmt;

use serde::Serialize;

use crate::bulk::{BulkOutcome, BulkResultKind};
use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text rendering of one command result.
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    fields: Vec<(String, String)>,
    rows: Vec<String>,
    failures: Vec<String>,
    warnings: Vec<String>,
    hints: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A labelled value shown under the title.
    pub fn field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// One line of a listing: a task, a milestone, a column slot.
    pub fn row(&mut self, line: impl Into<String>) {
        self.rows.push(line.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// A command worth running next.
    pub fn hint(&mut self, command: impl Into<String>) {
        self.hints.push(command.into());
    }

    /// Counts and per-task failures of a bulk operation.
    pub fn bulk(&mut self, outcome: &BulkOutcome) {
        let result = match outcome.kind() {
            BulkResultKind::Complete => outcome.summary(),
            BulkResultKind::Partial => format!("{} (partial)", outcome.summary()),
            BulkResultKind::NothingChanged => format!("{} (nothing changed)", outcome.summary()),
        };
        self.field("Result", result);
        if !outcome.changes.is_empty() {
            self.field("Changed", outcome.changes.len().to_string());
        }
        for failure in &outcome.failed {
            self.failures.push(format!("{}: {}", failure.id, failure.reason));
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;

        let width = self.fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in &self.fields {
            if value.is_empty() {
                write!(f, "\n  {key}")?;
            } else {
                write!(f, "\n  {key:<width$}  {value}")?;
            }
        }
        for row in &self.rows {
            write!(f, "\n    {row}")?;
        }

        let sections = [
            ("Failed", &self.failures),
            ("Warnings", &self.warnings),
            ("Next", &self.hints),
        ];
        for (label, items) in sections {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{label}:")?;
            for item in items {
                write!(f, "\n  {item}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: &Report,
) -> Result<()> {
    if options.json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings: report.warnings.clone(),
            next_steps: report.hints.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if !options.quiet {
        println!("{report}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints = recovery_hints(err);
    if json {
        let envelope: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: err.kind(),
                details: err.details(),
            }),
            warnings: Vec::new(),
            next_steps: hints,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    for hint in hints {
        eprintln!("  try: {hint}");
    }
    Ok(())
}

fn recovery_hints(err: &Error) -> Vec<String> {
    let hint = match err {
        Error::NotInitialized(_) => "taskboard init",
        Error::MilestoneNotFound(_) => "taskboard milestone list",
        Error::TaskNotFound(_) => "taskboard task list",
        Error::EmptyBulkUpdate => "taskboard task bulk <ids>... --status|--priority|--milestone <value>",
        Error::InvalidConfig(_) => "fix .taskboard.toml, then rerun",
        _ if err.is_transient() => "rerun the command",
        _ => return Vec::new(),
    };
    vec![hint.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::{BulkFailure, FailureReason};

    #[test]
    fn report_aligns_fields_and_lists_rows() {
        let mut report = Report::new("Column m1/todo");
        report.field("Total", "2");
        report.field("Renumbered", "");
        report.row("0: [todo][high] t1 Write docs");
        report.row("1: [todo][none] t2 Ship");
        report.hint("taskboard task move t2 --index 0");

        assert_eq!(
            report.to_string(),
            "Column m1/todo\n  Total       2\n  Renumbered\n    0: [todo][high] t1 Write docs\n    1: [todo][none] t2 Ship\n\nNext:\n  taskboard task move t2 --index 0"
        );
    }

    #[test]
    fn bulk_report_lists_failures_apart_from_warnings() {
        let outcome = BulkOutcome {
            requested: 3,
            succeeded: vec!["a".into(), "b".into()],
            failed: vec![BulkFailure {
                id: "x9".into(),
                reason: FailureReason::NotFound,
            }],
            changes: Vec::new(),
        };
        let mut report = Report::new("Bulk update");
        report.bulk(&outcome);
        report.warn("event output failed: disk full");

        assert_eq!(
            report.to_string(),
            "Bulk update\n  Result  updated 2 of 3 tasks (partial)\n\nFailed:\n  x9: not found\n\nWarnings:\n  event output failed: disk full"
        );
    }

    #[test]
    fn transient_errors_suggest_a_rerun() {
        let conflict = Error::ConcurrentModification {
            scope: "m1/todo".to_string(),
            position: 3,
        };
        assert_eq!(recovery_hints(&conflict), vec!["rerun the command"]);
        assert_eq!(
            recovery_hints(&Error::NotInitialized(".taskboard".into())),
            vec!["taskboard init"]
        );
        assert!(recovery_hints(&Error::PermissionDenied("p1".to_string())).is_empty());
    }
}

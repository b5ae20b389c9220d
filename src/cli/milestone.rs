//! taskboard milestone command implementations.

use serde::Serialize;

use crate::error::Result;
use crate::events;
use crate::model::Milestone;
use crate::output::{emit_success, Report};

use super::{emit_events, load_context, open_event_sink, Common};

pub struct AddOptions {
    pub project: String,
    pub name: String,
    pub common: Common,
}

pub struct ListOptions {
    pub project: Option<String>,
    pub common: Common,
}

#[derive(Serialize)]
struct MilestoneListOutput {
    total: usize,
    milestones: Vec<Milestone>,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), common.actor.clone())?;
    let (mut sink, events_to_stdout) = open_event_sink(common.events.as_deref())?;

    let milestone = ctx
        .board
        .add_milestone(options.project.trim(), &options.name)?;
    let warning = emit_events(
        &mut sink,
        events::milestone_created(&milestone, ctx.actor.as_deref()).map(|event| vec![event]),
    );

    let mut report = Report::new("Milestone created");
    if let Some(warning) = warning {
        report.warn(warning);
    }
    report.field("ID", milestone.id.to_string());
    report.field("Project", milestone.project.to_string());
    report.field("Name", milestone.name.clone());
    report.hint(format!("taskboard task add <title> --milestone {}", milestone.id));

    emit_success(
        common.output(events_to_stdout),
        "milestone add",
        &milestone,
        &report,
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let common = options.common;
    let ctx = load_context(common.root.clone(), None)?;
    let project = options
        .project
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let milestones: Vec<Milestone> = ctx
        .board
        .milestones()?
        .into_iter()
        .filter(|milestone| project.map_or(true, |project| milestone.project.as_str() == project))
        .collect();

    let mut report = Report::new("Milestones");
    report.field("Total", milestones.len().to_string());
    for milestone in &milestones {
        report.row(format!(
            "{} [{}] {}",
            milestone.id, milestone.project, milestone.name
        ));
    }

    let output = MilestoneListOutput {
        total: milestones.len(),
        milestones,
    };
    emit_success(common.output(false), "milestone list", &output, &report)
}

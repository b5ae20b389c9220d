//! taskboard init command implementation
//!
//! Writes a default `.taskboard.toml` and creates an empty board.

use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::model::ScopeMode;
use crate::output::{emit_success, Report, OutputOptions};
use crate::storage::FileStore;

pub struct InitOptions {
    pub scope: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    storage: PathBuf,
    scope: ScopeMode,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    board: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let root = super::resolve_root(options.root)?;
    let scope = options
        .scope
        .as_deref()
        .map(parse_scope_mode)
        .transpose()?;

    let created_config = ensure_config(&root, scope)?;
    let config = Config::load_from_dir(&root);
    let store = FileStore::new(config.storage_dir(&root))
        .with_lock_timeout(config.storage.lock_timeout_ms);
    let created_board = store.init()?;

    let summary = InitReport {
        root: root.clone(),
        storage: store.dir().to_path_buf(),
        scope: config.ordering.scope,
        created: InitCreated {
            config: created_config,
            board: created_board,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_board {
        created_items.push(format!("{}/", config.storage.dir));
    }

    let header = if created_items.is_empty() {
        "taskboard init: nothing to do".to_string()
    } else {
        "taskboard init: initialized board".to_string()
    };

    let mut report = Report::new(header);
    report.field("Root", root.display().to_string());
    report.field("Scope", scope_label(config.ordering.scope));
    report.field(
        "Created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    report.hint("taskboard milestone add <project> <name>");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &summary,
        &report,
    )
}

fn parse_scope_mode(raw: &str) -> Result<ScopeMode> {
    match raw.trim() {
        "status" => Ok(ScopeMode::Status),
        "milestone" => Ok(ScopeMode::Milestone),
        other => Err(Error::InvalidArgument(format!(
            "unknown scope '{other}' (expected status|milestone)"
        ))),
    }
}

fn scope_label(mode: ScopeMode) -> &'static str {
    match mode {
        ScopeMode::Status => "status",
        ScopeMode::Milestone => "milestone",
    }
}

fn ensure_config(root: &Path, scope: Option<ScopeMode>) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::InvalidConfig(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    let mut config = Config::default();
    if let Some(scope) = scope {
        config.ordering.scope = scope;
    }
    std::fs::create_dir_all(root)?;
    config.save(&config_path)?;
    Ok(true)
}

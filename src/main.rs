//! taskboard - task ordering and bulk mutation CLI
//!
//! Keeps milestone boards ordered: drag-and-drop style moves, column
//! reorders and bulk edits over a file-backed board.

use clap::Parser;
use taskboard::cli::Cli;
use taskboard::output::emit_error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG; an unusable filter leaves it off.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty() && raw.len() <= 4096)
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let command = cli.command.name();
    // Stdout events own stdout, so errors fall back to stderr text.
    let events_to_stdout = cli.events.as_deref().is_some_and(|dest| dest.trim() == "-");
    let json = cli.json && !events_to_stdout;

    if let Err(err) = cli.run() {
        let _ = emit_error(command, &err, json);
        std::process::exit(err.exit_code());
    }
}

//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{OutputFormat, format_export_summary, format_status, format_window};
use crate::cli::parser::{Cli, Commands, ExportConfig};
use crate::core::{Clock, SystemClock, TimeWindow};
use crate::error::{CommandError, Result};
use crate::export::{Destination, Exporter, write_document};
use crate::graph::{GraphService, SqliteGraph};
use std::path::Path;
use tracing::{error, info};

/// Executes the CLI command against the system clock.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    execute_with_clock(cli, &SystemClock).await
}

/// Executes the CLI command, resolving the export window from `clock`.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute_with_clock(cli: &Cli, clock: &dyn Clock) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Export { .. } => {
            let config = cli.export_config().ok_or_else(|| {
                CommandError::InvalidArgument("missing export configuration".to_string())
            })?;
            cmd_export(&config, clock, format).await
        }
        Commands::Window => Ok(cmd_window(clock, format)),
        Commands::Status { context } => {
            cmd_status(&cli.get_db_path(), context.as_deref(), format).await
        }
    }
}

// ==================== Command Implementations ====================

async fn cmd_export(config: &ExportConfig, clock: &dyn Clock, format: OutputFormat) -> Result<String> {
    let graph = SqliteGraph::open(&config.db_path)?;
    info!(db = %config.db_path.display(), "opened graph store");

    let window = TimeWindow::from_clock(clock);
    let exporter = Exporter::new(&graph, window).with_options(config.options);
    let document = exporter.export(&config.context).await?;

    let summary = write_document(
        &document,
        &config.destination,
        config.layout,
        &config.context,
        window,
    )
    .inspect_err(|e| error!(destination = %config.destination, error = %e, "export write failed"))?;
    info!(
        destination = %summary.destination,
        bytes = summary.bytes,
        "export written"
    );

    match config.destination {
        // The document itself went to stdout.
        Destination::Stdout => Ok(String::new()),
        Destination::File(_) => Ok(format_export_summary(&summary, format)),
    }
}

fn cmd_window(clock: &dyn Clock, format: OutputFormat) -> String {
    format_window(&TimeWindow::from_clock(clock), format)
}

async fn cmd_status(db_path: &Path, context: Option<&str>, format: OutputFormat) -> Result<String> {
    let graph = SqliteGraph::open(db_path)?;
    let stats = graph.stats()?;
    let contexts = graph.context_names()?;

    let resolved = match context {
        Some(name) => Some((name, graph.resolve_context(name).await?.is_some())),
        None => None,
    };

    Ok(format_status(&stats, &contexts, resolved, format))
}

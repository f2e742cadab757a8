//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::export::{Destination, ExportLayout, ExportOptions};
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// devgraph-export: dump a device graph with yesterday's time series to JSON.
///
/// Walks the devices of one context, their endpoints, and each endpoint's
/// history stream, and writes the result as a single JSON document.
#[derive(Parser, Debug)]
#[command(name = "devgraph-export")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the graph store.
    ///
    /// Defaults to `devgraph.db` in the current directory.
    #[arg(short, long, env = "DEVGRAPH_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a context's devices with yesterday's samples.
    Export {
        /// Name of the context holding the devices.
        #[arg(short, long, env = "DEVGRAPH_CONTEXT")]
        context: String,

        /// Output file (`-` for stdout).
        #[arg(short, long, env = "DEVGRAPH_OUTPUT", default_value = "export.json")]
        output: PathBuf,

        /// Maximum sibling requests in flight per level (unbounded if unset).
        #[arg(long)]
        max_concurrency: Option<NonZeroUsize>,

        /// JSON layout (array, envelope).
        #[arg(long, default_value = "array")]
        layout: ExportLayout,
    },

    /// Show the export window for the current time.
    Window,

    /// Show graph store statistics.
    Status {
        /// Also check whether this context resolves.
        #[arg(short, long, env = "DEVGRAPH_CONTEXT")]
        context: Option<String>,
    },
}

/// Everything an export run needs, resolved once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Graph store path.
    pub db_path: PathBuf,
    /// Context to export.
    pub context: String,
    /// Output destination.
    pub destination: Destination,
    /// JSON layout.
    pub layout: ExportLayout,
    /// Traversal options.
    pub options: ExportOptions,
}

impl Cli {
    /// Returns the graph store path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::graph::DEFAULT_DB_PATH))
    }

    /// Builds the export configuration if this is an `export` invocation.
    #[must_use]
    pub fn export_config(&self) -> Option<ExportConfig> {
        match &self.command {
            Commands::Export {
                context,
                output,
                max_concurrency,
                layout,
            } => Some(ExportConfig {
                db_path: self.get_db_path(),
                context: context.clone(),
                destination: Destination::from_path(output),
                layout: *layout,
                options: ExportOptions {
                    max_concurrency: *max_concurrency,
                },
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_db_path() {
        let cli = Cli {
            db_path: None,
            verbose: false,
            format: "text".to_string(),
            command: Commands::Window,
        };
        assert_eq!(
            cli.get_db_path(),
            PathBuf::from(crate::graph::DEFAULT_DB_PATH)
        );
        assert!(cli.export_config().is_none());
    }

    #[test]
    fn test_export_args() {
        let cli = Cli::try_parse_from([
            "devgraph-export",
            "--db-path",
            "/data/graph.db",
            "export",
            "--context",
            "Network",
            "--output",
            "-",
            "--max-concurrency",
            "8",
            "--layout",
            "envelope",
        ])
        .unwrap();

        let config = cli.export_config().unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/graph.db"));
        assert_eq!(config.context, "Network");
        assert_eq!(config.destination, Destination::Stdout);
        assert_eq!(config.layout, ExportLayout::Envelope);
        assert_eq!(config.options.max_concurrency, NonZeroUsize::new(8));
    }

    #[test]
    fn test_export_defaults() {
        let cli =
            Cli::try_parse_from(["devgraph-export", "export", "--context", "Network"]).unwrap();
        let config = cli.export_config().unwrap();
        assert_eq!(
            config.destination,
            Destination::File(PathBuf::from("export.json"))
        );
        assert_eq!(config.layout, ExportLayout::Array);
        assert_eq!(config.options, ExportOptions::default());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let result = Cli::try_parse_from([
            "devgraph-export",
            "export",
            "--context",
            "Network",
            "--max-concurrency",
            "0",
        ]);
        assert!(result.is_err());
    }
}

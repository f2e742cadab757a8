//! CLI layer for devgraph-export.
//!
//! Provides the command-line interface using clap, with commands for
//! exporting a context, inspecting the export window, and checking the
//! graph store.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, execute_with_clock};
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ExportConfig};

//! Error types for devgraph-export operations.
//!
//! This module provides the error hierarchy using `thiserror` for graph
//! reads, export output, and CLI commands. Remote read failures propagate
//! through every join up to the top-level export call; sink failures are
//! reported at the command boundary.

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Graph service errors (property, children, or sample reads).
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// I/O errors while writing the export.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors raised by a graph service backend.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The graph store cannot be reached or opened.
    #[error("graph service unavailable: {0}")]
    Unavailable(String),

    /// A query against the graph store failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A node handle does not refer to a node in the graph.
    #[error("node not found: {id}")]
    NodeNotFound {
        /// Node identifier.
        id: i64,
    },

    /// A required element property is missing or has the wrong type.
    #[error("invalid property '{property}' on node {id}: {reason}")]
    InvalidProperty {
        /// Node identifier.
        id: i64,
        /// Property name.
        property: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Stored properties or sample values could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// I/O-specific errors for export output.
#[derive(Error, Debug)]
pub enum IoError {
    /// Failed to write the output file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The document could not be serialized.
    #[error("failed to serialize export: {0}")]
    Serialize(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Graph(GraphError::from(err))
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::NotADatabase
                ) =>
            {
                Self::Unavailable(err.to_string())
            }
            _ => Self::Query(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

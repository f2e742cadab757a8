//! # devgraph-export
//!
//! Dumps a device graph together with yesterday's time series to JSON.
//!
//! Starting from a named context, the exporter collects every device, each
//! device's endpoints, and each endpoint's history stream. Samples are
//! limited to the previous local calendar day. Siblings are fetched
//! concurrently and the first failure aborts the whole export.
//!
//! ## Features
//!
//! - **Graph service**: [`GraphService`] trait with a `SQLite` store and an in-memory graph
//! - **Fail-fast traversal**: concurrent fan-out with an optional per-level cap
//! - **Flat records**: node properties merged with nested children
//! - **Layouts**: bare array or versioned envelope

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod error;
pub mod export;
pub mod graph;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{
    Clock, DeviceRecord, EndpointRecord, ExportDocument, HistoryRecord, Properties, SystemClock,
    TimeWindow,
};

// Re-export graph types
pub use graph::{DEFAULT_DB_PATH, GraphService, MemoryGraph, NodeId, Relation, Sample, SqliteGraph};

// Re-export export pipeline types
pub use export::{Destination, ExportLayout, ExportOptions, Exporter, write_document};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

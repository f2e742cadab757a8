//! Graph service layer.
//!
//! The exporter reads the device graph through the [`GraphService`] trait.
//! Two backends are provided: a read-only `SQLite` store and an in-memory
//! graph.

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryGraph;
pub use schema::{CURRENT_SCHEMA_VERSION, KIND_CONTEXT, KIND_DEVICE, KIND_ENDPOINT, KIND_HISTORY};
pub use sqlite::{GraphStats, SqliteGraph};
pub use traits::{GraphService, NodeId, Relation, Sample};

/// Default graph store path.
pub const DEFAULT_DB_PATH: &str = "devgraph.db";

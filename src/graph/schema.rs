//! Database schema definitions.
//!
//! Contains the SQL schema of the on-disk graph store read by
//! [`SqliteGraph`](crate::graph::SqliteGraph).

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Node kind of context roots.
pub const KIND_CONTEXT: &str = "context";

/// Node kind of devices.
pub const KIND_DEVICE: &str = "device";

/// Node kind of endpoints.
pub const KIND_ENDPOINT: &str = "endpoint";

/// Node kind of history streams.
pub const KIND_HISTORY: &str = "history";

/// SQL schema for initial database setup.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Graph nodes; properties hold the element snapshot as a JSON object
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    kind TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}'
);

-- Index for context lookup by name
CREATE INDEX IF NOT EXISTS idx_nodes_kind_name ON nodes(kind, name);

-- Labelled parent/child relations
CREATE TABLE IF NOT EXISTS edges (
    parent_id INTEGER NOT NULL,
    child_id INTEGER NOT NULL,
    relation TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (parent_id, child_id, relation),
    FOREIGN KEY (parent_id) REFERENCES nodes(id) ON DELETE CASCADE,
    FOREIGN KEY (child_id) REFERENCES nodes(id) ON DELETE CASCADE
);

-- Index for ordered children lookup
CREATE INDEX IF NOT EXISTS idx_edges_children ON edges(parent_id, relation, position);

-- Time-series samples of history nodes; value is a JSON scalar
CREATE TABLE IF NOT EXISTS samples (
    node_id INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    value TEXT NOT NULL,
    FOREIGN KEY (node_id) REFERENCES nodes(id) ON DELETE CASCADE
);

-- Index for window queries
CREATE INDEX IF NOT EXISTS idx_samples_window ON samples(node_id, timestamp);
";

/// SQL to check if schema is initialized.
pub const CHECK_SCHEMA_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='schema_info';
";

/// SQL to get schema version.
pub const GET_VERSION_SQL: &str = r"
SELECT value FROM schema_info WHERE key = 'version';
";

/// SQL to set schema version.
pub const SET_VERSION_SQL: &str = r"
INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);
";

/// SQL to resolve a context node by name.
pub const RESOLVE_CONTEXT_SQL: &str = r"
SELECT id FROM nodes WHERE kind = 'context' AND name = ? ORDER BY id LIMIT 1;
";

/// SQL to list ordered children of a node.
pub const CHILDREN_SQL: &str = r"
SELECT child_id FROM edges
WHERE parent_id = ? AND relation = ?
ORDER BY position, child_id;
";

/// SQL to read a node's element properties.
pub const ELEMENT_SQL: &str = r"
SELECT properties FROM nodes WHERE id = ?;
";

/// SQL to read the samples of a history node inside a half-open window.
pub const SAMPLES_SQL: &str = r"
SELECT timestamp, value FROM samples
WHERE node_id = ? AND timestamp >= ? AND timestamp < ?
ORDER BY timestamp, rowid;
";

//! `SQLite` graph store.
//!
//! A [`GraphService`] backed by a local `SQLite` database. Exports open the
//! store read-only; the seeding helpers exist for building fixtures and are
//! only usable on a store opened with [`SqliteGraph::create`] or
//! [`SqliteGraph::in_memory`].

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative counts.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::core::Properties;
use crate::error::{GraphError, Result};
use crate::graph::schema::{
    CHECK_SCHEMA_SQL, CHILDREN_SQL, CURRENT_SCHEMA_VERSION, ELEMENT_SQL, GET_VERSION_SQL,
    KIND_CONTEXT, KIND_DEVICE, KIND_ENDPOINT, KIND_HISTORY, RESOLVE_CONTEXT_SQL, SAMPLES_SQL,
    SCHEMA_SQL, SET_VERSION_SQL,
};
use crate::graph::traits::{GraphService, NodeId, Relation, Sample};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// SQLite-based graph store.
///
/// Reads are blocking calls behind one connection mutex, so sibling
/// requests from an unbounded fan-out are served one at a time.
///
/// # Examples
///
/// ```no_run
/// use devgraph_export::graph::SqliteGraph;
///
/// let graph = SqliteGraph::open("devgraph.db").unwrap();
/// ```
pub struct SqliteGraph {
    /// `SQLite` connection, shared by all concurrent reads.
    conn: Mutex<Connection>,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

/// Graph store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Number of context nodes.
    pub contexts: usize,
    /// Number of device nodes.
    pub devices: usize,
    /// Number of endpoint nodes.
    pub endpoints: usize,
    /// Number of history nodes.
    pub histories: usize,
    /// Number of relations.
    pub edges: usize,
    /// Number of stored samples.
    pub samples: usize,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}

impl SqliteGraph {
    /// Opens an existing graph store read-only.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unavailable`] if the file does not exist, cannot
    /// be opened, or does not contain a graph schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(GraphError::Unavailable(format!(
                "graph store not found: {}",
                path.display()
            ))
            .into());
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| GraphError::Unavailable(e.to_string()))?;

        let initialized: i64 = conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(|e| GraphError::Unavailable(e.to_string()))?;
        if initialized == 0 {
            return Err(GraphError::Unavailable(format!(
                "not a graph store: {}",
                path.display()
            ))
            .into());
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Creates (or reopens read-write) a graph store at `path` and ensures
    /// the schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| GraphError::Unavailable(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(GraphError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(GraphError::from)?;
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(GraphError::from)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Creates an in-memory graph store.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(GraphError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(GraphError::from)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| GraphError::Unavailable("connection lock poisoned".to_string()).into())
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn
            .get_mut()
            .map_err(|_| GraphError::Unavailable("connection lock poisoned".to_string()).into())
    }

    // ==================== Seeding ====================

    /// Inserts a node and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. on a read-only store).
    pub fn add_node(
        &mut self,
        kind: &str,
        name: Option<&str>,
        properties: &Properties,
    ) -> Result<NodeId> {
        let data = serde_json::to_string(properties).map_err(GraphError::from)?;
        let conn = self.conn_mut()?;
        conn.execute(
            "INSERT INTO nodes (name, kind, properties) VALUES (?, ?, ?)",
            params![name, kind, data],
        )
        .map_err(GraphError::from)?;
        Ok(NodeId(conn.last_insert_rowid()))
    }

    /// Inserts a context node named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add_context(&mut self, name: &str) -> Result<NodeId> {
        self.add_node(KIND_CONTEXT, Some(name), &Properties::new())
    }

    /// Appends `child` to the `relation` children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing or the insert fails.
    pub fn relate(&mut self, parent: NodeId, child: NodeId, relation: Relation) -> Result<()> {
        let conn = self.conn_mut()?;
        conn.execute(
            r"
            INSERT INTO edges (parent_id, child_id, relation, position)
            VALUES (?1, ?2, ?3, (
                SELECT COUNT(*) FROM edges WHERE parent_id = ?1 AND relation = ?3
            ))
        ",
            params![parent.0, child.0, relation.label()],
        )
        .map_err(GraphError::from)?;
        Ok(())
    }

    /// Stores samples for a history node.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any insert fails; no sample is
    /// stored in that case.
    pub fn add_samples(&mut self, node: NodeId, samples: &[Sample]) -> Result<()> {
        let conn = self.conn_mut()?;
        let tx = conn.transaction().map_err(GraphError::from)?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO samples (node_id, timestamp, value) VALUES (?, ?, ?)")
                .map_err(GraphError::from)?;
            for sample in samples {
                let value = serde_json::to_string(&sample.value).map_err(GraphError::from)?;
                stmt.execute(params![node.0, sample.timestamp, value])
                    .map_err(GraphError::from)?;
            }
        }
        tx.commit().map_err(GraphError::from)?;
        Ok(())
    }

    // ==================== Diagnostics ====================

    /// Names of all context nodes, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn context_names(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name FROM nodes WHERE kind = ? AND name IS NOT NULL ORDER BY id")
            .map_err(GraphError::from)?;
        let names = stmt
            .query_map(params![KIND_CONTEXT], |row| row.get(0))
            .map_err(GraphError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(GraphError::from)?;
        Ok(names)
    }

    /// Gathers store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if any count query fails.
    pub fn stats(&self) -> Result<GraphStats> {
        let conn = self.conn()?;
        let count_kind = |kind: &str| -> Result<usize> {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM nodes WHERE kind = ?",
                    params![kind],
                    |row| row.get(0),
                )
                .map_err(GraphError::from)?;
            Ok(n as usize)
        };
        let count_table = |sql: &str| -> Result<usize> {
            let n: i64 = conn
                .query_row(sql, [], |row| row.get(0))
                .map_err(GraphError::from)?;
            Ok(n as usize)
        };

        let schema_version: Option<String> = conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(GraphError::from)?;

        Ok(GraphStats {
            contexts: count_kind(KIND_CONTEXT)?,
            devices: count_kind(KIND_DEVICE)?,
            endpoints: count_kind(KIND_ENDPOINT)?,
            histories: count_kind(KIND_HISTORY)?,
            edges: count_table("SELECT COUNT(*) FROM edges")?,
            samples: count_table("SELECT COUNT(*) FROM samples")?,
            schema_version: schema_version.and_then(|v| v.parse().ok()).unwrap_or(0),
            db_size: self
                .path
                .as_ref()
                .and_then(|p| std::fs::metadata(p).ok())
                .map(|m| m.len()),
        })
    }

    fn ensure_node(conn: &Connection, node: NodeId) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM nodes WHERE id = ?", params![node.0], |row| {
                row.get(0)
            })
            .optional()
            .map_err(GraphError::from)?;
        if exists.is_none() {
            return Err(GraphError::NodeNotFound { id: node.0 }.into());
        }
        Ok(())
    }
}

/// Creates the schema on a fresh database; a no-op if it already exists.
fn init_schema(conn: &Connection) -> Result<()> {
    let is_init: i64 = conn
        .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
        .map_err(GraphError::from)?;

    if is_init == 0 {
        conn.execute_batch(SCHEMA_SQL).map_err(GraphError::from)?;
        conn.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()])
            .map_err(GraphError::from)?;
    }

    Ok(())
}

#[async_trait]
impl GraphService for SqliteGraph {
    async fn resolve_context(&self, name: &str) -> Result<Option<NodeId>> {
        let conn = self.conn()?;
        let id: Option<i64> = conn
            .query_row(RESOLVE_CONTEXT_SQL, params![name], |row| row.get(0))
            .optional()
            .map_err(GraphError::from)?;
        Ok(id.map(NodeId))
    }

    async fn get_children(&self, node: NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        let conn = self.conn()?;
        Self::ensure_node(&conn, node)?;

        let mut stmt = conn.prepare(CHILDREN_SQL).map_err(GraphError::from)?;
        let children = stmt
            .query_map(params![node.0, relation.label()], |row| {
                row.get::<_, i64>(0).map(NodeId)
            })
            .map_err(GraphError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(GraphError::from)?;
        Ok(children)
    }

    async fn get_element(&self, node: NodeId) -> Result<Properties> {
        let conn = self.conn()?;
        let data: Option<String> = conn
            .query_row(ELEMENT_SQL, params![node.0], |row| row.get(0))
            .optional()
            .map_err(GraphError::from)?;
        let data = data.ok_or(GraphError::NodeNotFound { id: node.0 })?;

        match serde_json::from_str::<Value>(&data).map_err(GraphError::from)? {
            Value::Object(properties) => Ok(properties),
            other => Err(GraphError::Serialization(format!(
                "properties of node {node} are not an object: {other}"
            ))
            .into()),
        }
    }

    async fn get_samples_between(
        &self,
        node: NodeId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Sample>> {
        let conn = self.conn()?;
        Self::ensure_node(&conn, node)?;

        let mut stmt = conn.prepare(SAMPLES_SQL).map_err(GraphError::from)?;
        let rows = stmt
            .query_map(params![node.0, start_ms, end_ms], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(GraphError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(GraphError::from)?;

        rows.into_iter()
            .map(|(timestamp, value)| -> Result<Sample> {
                let value = serde_json::from_str(&value).map_err(GraphError::from)?;
                Ok(Sample { timestamp, value })
            })
            .collect()
    }
}

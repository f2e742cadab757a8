//! Graph service trait definition.
//!
//! Defines the read-only capability set the exporter consumes from a graph
//! backend. Every node kind (context, device, endpoint, history) exposes the
//! same two operations, element read and children lookup, so nodes are plain
//! handles and the relation label selects what to traverse.

use crate::core::Properties;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque handle to a node in the graph service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relation labels traversed by the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Context to device.
    HasDevice,
    /// Device to endpoint.
    HasEndpoint,
    /// Endpoint to history stream.
    HasHistory,
}

impl Relation {
    /// Label stored on graph edges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HasDevice => "hasDevice",
            Self::HasEndpoint => "hasEndpoint",
            Self::HasHistory => "hasHistory",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped reading of a history stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Scalar reading.
    pub value: Value,
}

impl Sample {
    /// Creates a sample.
    pub fn new(timestamp: i64, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

/// Read-only access to a device graph.
///
/// Implementations may be backed by a remote service; every method is a
/// suspension point. The exporter shares one instance across all concurrent
/// requests and never mutates graph state through it.
#[async_trait]
pub trait GraphService: Send + Sync {
    /// Looks up a context node by name.
    ///
    /// Returns `None` if no context has that name.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn resolve_context(&self, name: &str) -> Result<Option<NodeId>>;

    /// Lists the children of `node` related by `relation`, in service order.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the read fails.
    async fn get_children(&self, node: NodeId, relation: Relation) -> Result<Vec<NodeId>>;

    /// Reads the element properties owned by `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the read fails.
    async fn get_element(&self, node: NodeId) -> Result<Properties>;

    /// Fetches the samples of a history node with `start_ms <= t < end_ms`,
    /// ordered by timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the read fails.
    async fn get_samples_between(
        &self,
        node: NodeId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Sample>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Relation::HasDevice, "hasDevice")]
    #[test_case(Relation::HasEndpoint, "hasEndpoint")]
    #[test_case(Relation::HasHistory, "hasHistory")]
    fn test_relation_labels(relation: Relation, label: &str) {
        assert_eq!(relation.label(), label);
        assert_eq!(relation.to_string(), label);
    }

    #[test]
    fn test_node_id_serializes_bare() {
        assert_eq!(serde_json::to_string(&NodeId(42)).unwrap(), "42");
        assert_eq!(NodeId(42).to_string(), "42");
    }
}

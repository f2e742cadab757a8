//! In-process graph backend.
//!
//! [`MemoryGraph`] keeps nodes, relations, and samples in plain collections.
//! Reads can be made to fail per node, and every request yields once so that
//! concurrent requests interleave the way remote calls would; the peak
//! number of outstanding requests is recorded.

use crate::core::{Properties, TimeWindow};
use crate::error::{GraphError, Result};
use crate::graph::traits::{GraphService, NodeId, Relation, Sample};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct MemoryNode {
    properties: Properties,
    children: HashMap<Relation, Vec<NodeId>>,
    samples: Vec<Sample>,
}

/// Which read should fail for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FailOn {
    Element,
    Children,
    Samples,
}

/// In-memory [`GraphService`].
///
/// # Examples
///
/// ```
/// use devgraph_export::graph::{MemoryGraph, Relation};
///
/// let mut graph = MemoryGraph::new();
/// let ctx = graph.add_context("Network");
/// let device = graph.add_node(Default::default());
/// graph.relate(ctx, device, Relation::HasDevice);
/// ```
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: HashMap<NodeId, MemoryNode>,
    contexts: HashMap<String, NodeId>,
    failures: HashSet<(NodeId, FailOn)>,
    next_id: i64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: AtomicUsize,
}

impl MemoryGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node with the given element properties.
    pub fn add_node(&mut self, properties: Properties) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            MemoryNode {
                properties,
                ..MemoryNode::default()
            },
        );
        id
    }

    /// Adds a context node resolvable by `name`.
    pub fn add_context(&mut self, name: &str) -> NodeId {
        let id = self.add_node(Properties::new());
        self.contexts.insert(name.to_string(), id);
        id
    }

    /// Appends `child` to the `relation` children of `parent`.
    pub fn relate(&mut self, parent: NodeId, child: NodeId, relation: Relation) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.entry(relation).or_default().push(child);
        }
    }

    /// Appends samples to a node.
    pub fn add_samples(&mut self, node: NodeId, samples: impl IntoIterator<Item = Sample>) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.samples.extend(samples);
        }
    }

    /// Makes element reads of `node` fail.
    pub fn fail_element(&mut self, node: NodeId) {
        self.failures.insert((node, FailOn::Element));
    }

    /// Makes children lookups of `node` fail.
    pub fn fail_children(&mut self, node: NodeId) {
        self.failures.insert((node, FailOn::Children));
    }

    /// Makes sample reads of `node` fail.
    pub fn fail_samples(&mut self, node: NodeId) {
        self.failures.insert((node, FailOn::Samples));
    }

    /// Peak number of requests that were outstanding at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Total number of requests served.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Tracks one request: counts it as in flight across a yield point and
    /// then checks the node and the configured failures.
    async fn request(&self, node: NodeId, op: FailOn) -> Result<&MemoryNode> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(&(node, op)) {
            return Err(GraphError::Query(format!("injected failure on node {node}")).into());
        }
        self.nodes
            .get(&node)
            .ok_or_else(|| GraphError::NodeNotFound { id: node.0 }.into())
    }
}

#[async_trait]
impl GraphService for MemoryGraph {
    async fn resolve_context(&self, name: &str) -> Result<Option<NodeId>> {
        tokio::task::yield_now().await;
        Ok(self.contexts.get(name).copied())
    }

    async fn get_children(&self, node: NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        let node = self.request(node, FailOn::Children).await?;
        Ok(node.children.get(&relation).cloned().unwrap_or_default())
    }

    async fn get_element(&self, node: NodeId) -> Result<Properties> {
        let node = self.request(node, FailOn::Element).await?;
        Ok(node.properties.clone())
    }

    async fn get_samples_between(
        &self,
        node: NodeId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Sample>> {
        let node = self.request(node, FailOn::Samples).await?;
        let window = TimeWindow::new(start_ms, end_ms);
        let mut samples: Vec<Sample> = node
            .samples
            .iter()
            .filter(|s| window.contains(s.timestamp))
            .cloned()
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }
}

//! Graph traversal and record materialization.
//!
//! The walk has a fixed depth (context, device, endpoint, history) and an
//! unknown width. Each level joins its children with "wait for all, fail on
//! first error" semantics, so a single failed read anywhere aborts the whole
//! export. Sibling futures are not spawned; when a join fails the remaining
//! ones are simply dropped.

use crate::core::{
    DeviceRecord, EndpointRecord, ExportDocument, HistoryRecord, Properties, TimeWindow,
};
use crate::error::{GraphError, Result};
use crate::graph::{GraphService, NodeId, Relation};
use futures_util::future::try_join_all;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use futures_util::try_join;
use serde_json::{Number, Value};
use std::future::Future;
use std::num::NonZeroUsize;
use tracing::{debug, error, info};

/// Property holding a history stream's sampling frequency.
pub const FREQUENCY_PROPERTY: &str = "frequency";

/// Property holding a history stream's archive retention.
pub const ARCHIVE_TIME_PROPERTY: &str = "archiveTime";

/// Tuning knobs that do not change the exported document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Maximum sibling requests in flight per join; `None` is unbounded.
    pub max_concurrency: Option<NonZeroUsize>,
}

/// Export context: the graph handle, the resolved window, and options.
///
/// Built once per run and passed down every traversal call.
///
/// # Examples
///
/// ```
/// use devgraph_export::core::TimeWindow;
/// use devgraph_export::export::Exporter;
/// use devgraph_export::graph::MemoryGraph;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let graph = MemoryGraph::new();
/// let exporter = Exporter::new(&graph, TimeWindow::new(0, 86_400_000));
/// let doc = rt.block_on(exporter.export("Missing")).unwrap();
/// assert!(doc.is_empty());
/// ```
#[derive(Debug)]
pub struct Exporter<'g, G: ?Sized> {
    graph: &'g G,
    window: TimeWindow,
    options: ExportOptions,
}

impl<'g, G: GraphService + ?Sized> Exporter<'g, G> {
    /// Creates an exporter over `graph` for `window`.
    #[must_use]
    pub fn new(graph: &'g G, window: TimeWindow) -> Self {
        Self {
            graph,
            window,
            options: ExportOptions::default(),
        }
    }

    /// Sets the export options.
    #[must_use]
    pub const fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// The export window.
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        self.window
    }

    /// Resolves `context_name` and walks it.
    ///
    /// An unknown context is reported and yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns the first graph read failure encountered anywhere in the tree.
    pub async fn export(&self, context_name: &str) -> Result<ExportDocument> {
        info!(
            context = context_name,
            start = self.window.start,
            end = self.window.end,
            "starting export"
        );

        let context = self.graph.resolve_context(context_name).await?;
        if context.is_none() {
            error!(context = context_name, "no context found; exporting zero devices");
        }

        let document = self.walk(context).await?;
        info!(
            devices = document.len(),
            endpoints = document.endpoint_count(),
            samples = document.sample_count(),
            "export materialized"
        );
        Ok(document)
    }

    /// Walks a resolved context: every device child, in enumeration order.
    ///
    /// # Errors
    ///
    /// Fails if any device fails.
    pub async fn walk(&self, context: Option<NodeId>) -> Result<ExportDocument> {
        let Some(context) = context else {
            return Ok(ExportDocument::empty());
        };

        let devices = self
            .graph
            .get_children(context, Relation::HasDevice)
            .await?;
        debug!(context = %context, devices = devices.len(), "walking context");

        let records = self
            .fan_out(devices, |device| self.materialize_device(device))
            .await?;
        Ok(ExportDocument::new(records))
    }

    /// Materializes a device and all of its endpoints.
    ///
    /// # Errors
    ///
    /// Fails if the device read or any endpoint fails; no partial device is
    /// produced.
    pub async fn materialize_device(&self, node: NodeId) -> Result<DeviceRecord> {
        let (properties, endpoints) = try_join!(
            self.graph.get_element(node),
            self.graph.get_children(node, Relation::HasEndpoint)
        )?;
        debug!(device = %node, endpoints = endpoints.len(), "materializing device");

        let endpoints = self
            .fan_out(endpoints, |endpoint| self.materialize_endpoint(endpoint))
            .await?;
        Ok(DeviceRecord::new(properties, endpoints))
    }

    /// Materializes an endpoint and its first history stream, if any.
    ///
    /// Additional history children are not exported.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint read or the history read fails.
    pub async fn materialize_endpoint(&self, node: NodeId) -> Result<EndpointRecord> {
        let (properties, histories) = try_join!(
            self.graph.get_element(node),
            self.graph.get_children(node, Relation::HasHistory)
        )?;

        let history = match histories.split_first() {
            None => None,
            Some((first, rest)) => {
                if !rest.is_empty() {
                    debug!(
                        endpoint = %node,
                        dropped = rest.len(),
                        "endpoint has several history streams; exporting the first"
                    );
                }
                Some(self.materialize_history(*first).await?)
            }
        };

        Ok(EndpointRecord::new(properties, history))
    }

    /// Reads a history stream's metadata and its samples inside the window.
    ///
    /// # Errors
    ///
    /// Fails if either read fails or `frequency` / `archiveTime` is missing
    /// or not a number.
    pub async fn materialize_history(&self, node: NodeId) -> Result<HistoryRecord> {
        let (element, samples) = try_join!(
            self.graph.get_element(node),
            self.graph
                .get_samples_between(node, self.window.start, self.window.end)
        )?;

        let frequency = numeric_property(node, &element, FREQUENCY_PROPERTY)?;
        let archive_time = numeric_property(node, &element, ARCHIVE_TIME_PROPERTY)?;
        let data: Vec<Value> = samples.into_iter().map(|s| s.value).collect();
        debug!(history = %node, samples = data.len(), "materialized history");

        Ok(HistoryRecord::new(frequency, archive_time, self.window, data))
    }

    /// Runs `f` over `nodes` concurrently, keeping input order and failing on
    /// the first error.
    async fn fan_out<T, F, Fut>(&self, nodes: Vec<NodeId>, f: F) -> Result<Vec<T>>
    where
        F: FnMut(NodeId) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.options.max_concurrency {
            None => try_join_all(nodes.into_iter().map(f)).await,
            Some(limit) => {
                stream::iter(nodes)
                    .map(f)
                    .buffered(limit.get())
                    .try_collect()
                    .await
            }
        }
    }
}

fn numeric_property(node: NodeId, element: &Properties, name: &str) -> Result<Number> {
    match element.get(name) {
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(other) => Err(GraphError::InvalidProperty {
            id: node.0,
            property: name.to_string(),
            reason: format!("expected a number, found {other}"),
        }
        .into()),
        None => Err(GraphError::InvalidProperty {
            id: node.0,
            property: name.to_string(),
            reason: "missing".to_string(),
        }
        .into()),
    }
}

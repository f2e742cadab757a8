//! Export records.
//!
//! Pure output types that mirror the graph shape: a document holds devices,
//! a device holds endpoints, an endpoint holds at most one history record.
//! Records are built bottom-up and never modified once attached to a parent.

use crate::core::window::TimeWindow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Flat snapshot of a graph element's properties.
pub type Properties = Map<String, Value>;

/// Version tag written by [`ExportEnvelope`].
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Time-series data of one history stream inside the export window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Sampling frequency of the stream.
    pub frequency: Number,
    /// Archive retention of the stream.
    pub archive_time: Number,
    /// Window start (epoch ms, inclusive).
    pub start: i64,
    /// Window end (epoch ms, exclusive).
    pub end: i64,
    /// Sample values in service order.
    pub data: Vec<Value>,
}

impl HistoryRecord {
    /// Creates a history record for `window`.
    #[must_use]
    pub const fn new(
        frequency: Number,
        archive_time: Number,
        window: TimeWindow,
        data: Vec<Value>,
    ) -> Self {
        Self {
            frequency,
            archive_time,
            start: window.start,
            end: window.end,
            data,
        }
    }

    /// The window this record covers.
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// An endpoint's properties plus its materialized history, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    #[serde(flatten)]
    properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    history: Option<HistoryRecord>,
}

impl EndpointRecord {
    /// Key the history record is stored under.
    pub const HISTORY_KEY: &'static str = "history";

    /// Builds an endpoint record. A `history` element property is replaced
    /// by the materialized history (or dropped when there is none).
    #[must_use]
    pub fn new(mut properties: Properties, history: Option<HistoryRecord>) -> Self {
        properties.remove(Self::HISTORY_KEY);
        Self {
            properties,
            history,
        }
    }

    /// Element properties of the endpoint.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Materialized history, if the endpoint has a history child.
    #[must_use]
    pub const fn history(&self) -> Option<&HistoryRecord> {
        self.history.as_ref()
    }
}

/// A device's properties plus all of its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(flatten)]
    properties: Properties,
    endpoints: Vec<EndpointRecord>,
}

impl DeviceRecord {
    /// Key the endpoint array is stored under.
    pub const ENDPOINTS_KEY: &'static str = "endpoints";

    /// Builds a device record. An `endpoints` element property is replaced
    /// by the materialized endpoint array.
    #[must_use]
    pub fn new(mut properties: Properties, endpoints: Vec<EndpointRecord>) -> Self {
        properties.remove(Self::ENDPOINTS_KEY);
        Self {
            properties,
            endpoints,
        }
    }

    /// Element properties of the device.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Endpoints in enumeration order.
    #[must_use]
    pub fn endpoints(&self) -> &[EndpointRecord] {
        &self.endpoints
    }
}

/// The complete export: every device under the context, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportDocument {
    devices: Vec<DeviceRecord>,
}

impl ExportDocument {
    /// Creates a document from materialized devices.
    #[must_use]
    pub const fn new(devices: Vec<DeviceRecord>) -> Self {
        Self { devices }
    }

    /// An export with no devices.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Devices in enumeration order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if the export has no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Total endpoints across all devices.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.devices.iter().map(|d| d.endpoints.len()).sum()
    }

    /// Total samples across all history records.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.devices
            .iter()
            .flat_map(|d| d.endpoints.iter())
            .filter_map(|e| e.history.as_ref())
            .map(|h| h.data.len())
            .sum()
    }
}

/// Versioned wrapper around the device array.
///
/// Write-only: it borrows the document. Read an envelope back by parsing its
/// `devices` field as an [`ExportDocument`].
#[derive(Debug, Serialize)]
pub struct ExportEnvelope<'a> {
    /// Format version, see [`EXPORT_FORMAT_VERSION`].
    pub version: u32,
    /// Context the devices were read from.
    pub context: &'a str,
    /// Export window.
    pub window: TimeWindow,
    /// Exported devices.
    pub devices: &'a [DeviceRecord],
}

impl<'a> ExportEnvelope<'a> {
    /// Wraps `document` with the current format version.
    #[must_use]
    pub fn new(context: &'a str, window: TimeWindow, document: &'a ExportDocument) -> Self {
        Self {
            version: EXPORT_FORMAT_VERSION,
            context,
            window,
            devices: document.devices(),
        }
    }
}

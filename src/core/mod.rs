//! Core domain models for devgraph-export.
//!
//! The export window and the output records. These are pure data types
//! with no I/O dependencies.

pub mod record;
pub mod window;

pub use record::{
    DeviceRecord, EXPORT_FORMAT_VERSION, EndpointRecord, ExportDocument, ExportEnvelope,
    HistoryRecord, Properties,
};
pub use window::{Clock, FixedClock, SystemClock, TimeWindow};

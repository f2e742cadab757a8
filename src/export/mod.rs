//! Export pipeline.
//!
//! [`Exporter`] walks the graph and materializes the document; the sink
//! serializes it and writes it out.

pub mod sink;
pub mod walker;

pub use sink::{Destination, ExportLayout, ExportSummary, render, write_document};
pub use walker::{ARCHIVE_TIME_PROPERTY, ExportOptions, Exporter, FREQUENCY_PROPERTY};

//! Export output.
//!
//! Serializes the finished document to indented JSON and writes it to a file
//! or stdout. The destination handle is scoped to the write call and closed
//! on every exit path.

use crate::core::{ExportDocument, ExportEnvelope, TimeWindow};
use crate::error::{IoError, Result};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Shape of the written JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportLayout {
    /// Bare array of devices.
    #[default]
    Array,
    /// Versioned object wrapping the devices.
    Envelope,
}

impl FromStr for ExportLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "array" => Ok(Self::Array),
            "envelope" => Ok(Self::Envelope),
            other => Err(format!("unknown layout '{other}' (expected array or envelope)")),
        }
    }
}

/// Where the export is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output.
    Stdout,
    /// A file, created or truncated.
    File(PathBuf),
}

impl Destination {
    /// Interprets `-` as stdout and anything else as a file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdout
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Where the document went.
    pub destination: String,
    /// Context that was exported.
    pub context: String,
    /// Export window.
    pub window: TimeWindow,
    /// Number of devices.
    pub devices: usize,
    /// Number of endpoints.
    pub endpoints: usize,
    /// Number of samples.
    pub samples: usize,
    /// Bytes written.
    pub bytes: usize,
}

/// Renders `document` as 2-space indented JSON in the given layout.
///
/// # Errors
///
/// Returns [`IoError::Serialize`] if serialization fails.
pub fn render(
    document: &ExportDocument,
    layout: ExportLayout,
    context: &str,
    window: TimeWindow,
) -> Result<String> {
    let text = match layout {
        ExportLayout::Array => serde_json::to_string_pretty(document),
        ExportLayout::Envelope => {
            serde_json::to_string_pretty(&ExportEnvelope::new(context, window, document))
        }
    }
    .map_err(|e| IoError::Serialize(e.to_string()))?;
    Ok(text)
}

/// Writes the export to `destination`.
///
/// # Errors
///
/// Returns an error if serialization, directory creation, or the write
/// fails. A failed file write may leave a truncated file behind.
pub fn write_document(
    document: &ExportDocument,
    destination: &Destination,
    layout: ExportLayout,
    context: &str,
    window: TimeWindow,
) -> Result<ExportSummary> {
    let mut text = render(document, layout, context, window)?;
    text.push('\n');

    match destination {
        Destination::Stdout => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_all(&mut handle, text.as_bytes()).map_err(|e| IoError::WriteFailed {
                path: destination.to_string(),
                reason: e.to_string(),
            })?;
        }
        Destination::File(path) => write_file(path, &text)?,
    }

    Ok(ExportSummary {
        destination: destination.to_string(),
        context: context.to_string(),
        window,
        devices: document.len(),
        endpoints: document.endpoint_count(),
        samples: document.sample_count(),
        bytes: text.len(),
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let path_str = path.to_string_lossy().to_string();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
            path: parent.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }

    let file = File::create(path).map_err(|e| IoError::WriteFailed {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    write_all(&mut writer, content.as_bytes()).map_err(|e| IoError::WriteFailed {
        path: path_str,
        reason: e.to_string(),
    })?;

    Ok(())
}

fn write_all<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)?;
    writer.flush()
}

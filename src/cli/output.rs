//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::TimeWindow;
use crate::error::Error;
use crate::export::ExportSummary;
use crate::graph::GraphStats;
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats the result of a completed export.
#[must_use]
pub fn format_export_summary(summary: &ExportSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "Export successful, output written to {}",
                summary.destination
            );
            let _ = writeln!(output, "  Context:    {}", summary.context);
            let _ = writeln!(
                output,
                "  Window:     {} .. {}",
                format_timestamp(summary.window.start),
                format_timestamp(summary.window.end)
            );
            let _ = writeln!(output, "  Devices:    {}", summary.devices);
            let _ = writeln!(output, "  Endpoints:  {}", summary.endpoints);
            let _ = writeln!(output, "  Samples:    {}", summary.samples);
            let _ = writeln!(output, "  Size:       {} bytes", summary.bytes);
            output
        }
        OutputFormat::Json => format_json(summary),
    }
}

/// Formats the export window.
#[must_use]
pub fn format_window(window: &TimeWindow, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "start: {} ({})",
                window.start,
                format_timestamp(window.start)
            );
            let _ = writeln!(
                output,
                "end:   {} ({})",
                window.end,
                format_timestamp(window.end)
            );
            output
        }
        OutputFormat::Json => format_json(window),
    }
}

/// Formats graph store statistics and context resolution.
#[must_use]
pub fn format_status(
    stats: &GraphStats,
    contexts: &[String],
    resolved: Option<(&str, bool)>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str("Graph Store Status\n");
            output.push_str("==================\n\n");
            let _ = writeln!(output, "  Contexts:   {}", stats.contexts);
            let _ = writeln!(output, "  Devices:    {}", stats.devices);
            let _ = writeln!(output, "  Endpoints:  {}", stats.endpoints);
            let _ = writeln!(output, "  Histories:  {}", stats.histories);
            let _ = writeln!(output, "  Relations:  {}", stats.edges);
            let _ = writeln!(output, "  Samples:    {}", stats.samples);
            let _ = writeln!(output, "  Schema:     v{}", stats.schema_version);
            if let Some(size) = stats.db_size {
                let _ = writeln!(output, "  DB size:    {size} bytes");
            }
            if !contexts.is_empty() {
                let _ = writeln!(output, "\nContexts: {}", contexts.join(", "));
            }
            if let Some((name, found)) = resolved {
                let _ = writeln!(
                    output,
                    "\nContext '{name}': {}",
                    if found { "found" } else { "not found" }
                );
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct StatusOutput<'a> {
                #[serde(flatten)]
                stats: &'a GraphStats,
                context_names: &'a [String],
                #[serde(skip_serializing_if = "Option::is_none")]
                context: Option<&'a str>,
                #[serde(skip_serializing_if = "Option::is_none")]
                context_found: Option<bool>,
            }
            format_json(&StatusOutput {
                stats,
                context_names: contexts,
                context: resolved.map(|(name, _)| name),
                context_found: resolved.map(|(_, found)| found),
            })
        }
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }
            format_json(&ErrorOutput {
                error: error.to_string(),
            })
        }
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats epoch milliseconds as a local RFC 3339 timestamp.
fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| millis.to_string(), |dt| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    fn summary() -> ExportSummary {
        ExportSummary {
            destination: "export.json".to_string(),
            context: "Network".to_string(),
            window: TimeWindow::new(0, 86_400_000),
            devices: 2,
            endpoints: 5,
            samples: 120,
            bytes: 4096,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_format_export_summary() {
        let text = format_export_summary(&summary(), OutputFormat::Text);
        assert!(text.contains("output written to export.json"));
        assert!(text.contains("Devices:    2"));

        let json = format_export_summary(&summary(), OutputFormat::Json);
        assert!(json.contains("\"samples\": 120"));
    }

    #[test]
    fn test_format_window() {
        let window = TimeWindow::new(1_000, 2_000);
        let json = format_window(&window, OutputFormat::Json);
        assert!(json.contains("\"start\": 1000"));
        assert!(json.contains("\"end\": 2000"));

        let text = format_window(&window, OutputFormat::Text);
        assert!(text.starts_with("start: 1000 ("));
    }

    #[test]
    fn test_format_status() {
        let stats = GraphStats {
            contexts: 1,
            devices: 3,
            schema_version: 1,
            ..GraphStats::default()
        };
        let contexts = vec!["Network".to_string()];

        let text = format_status(&stats, &contexts, Some(("Other", false)), OutputFormat::Text);
        assert!(text.contains("Devices:    3"));
        assert!(text.contains("Contexts: Network"));
        assert!(text.contains("Context 'Other': not found"));

        let json = format_status(&stats, &contexts, None, OutputFormat::Json);
        assert!(json.contains("\"devices\": 3"));
        assert!(!json.contains("context_found"));
    }

    #[test]
    fn test_format_error() {
        let err = Error::Graph(GraphError::Unavailable("gone".to_string()));
        assert_eq!(
            format_error(&err, OutputFormat::Text),
            "graph error: graph service unavailable: gone"
        );
        assert!(format_error(&err, OutputFormat::Json).contains("\"error\""));
    }
}

//! Output formatting for CLI commands.
//!
//! This module renders compilation reports and failures in text or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::compiler::{CompilationMode, CompilationReport};
use crate::error::InventoryError;
use crate::network::AddressSource;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Resolved node row for table display.
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Source")]
    source: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a compilation report for display.
    #[must_use]
    pub fn format_report(&self, report: &CompilationReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    /// Formats a report as text.
    fn format_report_text(report: &CompilationReport) -> String {
        let mut output = String::new();

        let headline = match report.mode {
            CompilationMode::Check => "Configuration is valid",
            CompilationMode::Generate => "Inventories generated",
        };
        let _ = writeln!(
            output,
            "{} {headline} for {} ({})",
            "✓".green(),
            report.environment.bold(),
            report.cluster_name
        );
        if let Some(fingerprint) = &report.fingerprint {
            let _ = writeln!(output, "   Fingerprint: {fingerprint}");
        }
        let _ = writeln!(
            output,
            "   Virtual IP:  {}\n",
            report
                .virtual_ip
                .as_deref()
                .map_or_else(|| "not set".yellow().to_string(), ToString::to_string)
        );

        let rows: Vec<NodeRow> = report
            .nodes
            .iter()
            .map(|n| NodeRow {
                hostname: n.hostname.clone(),
                role: n.role.to_string(),
                ip: n.ip.clone(),
                source: Self::format_source(n.source),
            })
            .collect();
        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        if !report.written.is_empty() {
            output.push_str("\nWritten:\n");
            for path in &report.written {
                let _ = writeln!(output, "  {}", path.display());
            }
        }

        if !report.warnings.is_empty() {
            output.push_str("\nWarnings:\n");
            for warning in &report.warnings {
                let _ = writeln!(output, "  {} {warning}", "⚠".yellow());
            }
        }

        output
    }

    /// Formats a failure for display.
    #[must_use]
    pub fn format_error(&self, error: &InventoryError) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "status": "error",
                    "stage": error.stage(),
                    "message": error.to_string(),
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {error}", "✗".red()),
        }
    }

    /// Formats an address source.
    fn format_source(source: AddressSource) -> String {
        match source {
            AddressSource::Discovered => "discovered".cyan().to_string(),
            AddressSource::Declared => "declared".green().to_string(),
            AddressSource::ComputedDefault => "computed".yellow().to_string(),
        }
    }
}

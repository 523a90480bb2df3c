// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - exports a flow graph to various formats

use super::{required, Options};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON format
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown export format: {other}. Supported: dot, json")),
        }
    }
}

impl ExportFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

/// Run the export command
pub fn run(opts: &Options, flow: Option<String>, format: &str, output: Option<PathBuf>) -> Result<()> {
    let export_format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;
    let flow_id = required(flow, "--flow")?;
    info!(flow = %flow_id, format = export_format.extension(), "exporting");

    let graph = opts.load_workspace()?.graph(&flow_id)?;
    if graph.is_empty() {
        eprintln!("Warning: Flow is empty. Use 'flowdeck node add' first.");
    }

    let content = match export_format {
        ExportFormat::Dot => graph.to_dot(),
        ExportFormat::Json => graph.to_json()?,
    };

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("DOT".parse::<ExportFormat>(), Ok(ExportFormat::Dot));
        assert_eq!("graphviz".parse::<ExportFormat>(), Ok(ExportFormat::Dot));
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert!("yaml".parse::<ExportFormat>().is_err());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Logs command - render the log stream of an execution

use super::{print_json, required, Options};
use crate::logs::render_entries;
use crate::types::{LogEntry, LogLevel};
use anyhow::Result;

/// Run the logs command
pub fn run(
    opts: &Options,
    execution: Option<String>,
    node: Option<String>,
    level: Option<String>,
) -> Result<()> {
    let execution_id = required(execution, "Execution id")?;
    let min_level = match level.as_deref() {
        Some(l) => l.parse::<LogLevel>().map_err(anyhow::Error::msg)?,
        None => LogLevel::Debug,
    };

    let stream = opts.client()?.fetch_logs(&execution_id)?;
    let entries: Vec<&LogEntry> = stream
        .entries()
        .iter()
        .filter(|e| e.level >= min_level)
        .filter(|e| node.is_none() || e.node_id == node)
        .collect();

    if opts.json {
        return print_json(&entries);
    }
    print!("{}", render_entries(&execution_id, entries, opts.color));
    Ok(())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Append-only execution log streams
//!
//! A `LogStream` keeps entries exactly as they arrive. It never sorts and
//! never deduplicates; consumers render it as-is.

use crate::types::{LogEntry, LogLevel};
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use tracing::warn;

/// Ordered log entries of one execution
#[derive(Debug, Clone, PartialEq)]
pub struct LogStream {
    execution_id: String,
    entries: Vec<LogEntry>,
}

impl LogStream {
    /// An empty stream for `execution_id`
    #[must_use]
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            entries: Vec::new(),
        }
    }

    /// Wrap entries that were received earlier, keeping their order
    #[must_use]
    pub fn from_entries(execution_id: impl Into<String>, entries: Vec<LogEntry>) -> Self {
        Self {
            execution_id: execution_id.into(),
            entries,
        }
    }

    /// Execution this stream belongs to
    #[must_use]
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Append an entry at the end.
    ///
    /// Entries older than the last one are still appended where they arrive.
    pub fn append(&mut self, entry: LogEntry) {
        if let Some(last) = self.entries.last() {
            if entry.timestamp < last.timestamp {
                warn!(
                    execution = %self.execution_id,
                    "log entry at {} arrived after {}",
                    entry.timestamp,
                    last.timestamp
                );
            }
        }
        self.entries.push(entry);
    }

    /// All entries in arrival order
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Consume the stream, returning its entries
    #[must_use]
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries concerning one node
    pub fn for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.node_id.as_deref() == Some(node_id))
    }

    /// Entries at `level` or more severe
    pub fn at_least(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter().filter(move |e| e.level >= level)
    }

    /// Render the stream as text lines, or the empty-state message
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        render_entries(&self.execution_id, self.entries.iter(), color)
    }
}

/// Render a sequence of entries for display.
///
/// An empty sequence renders the empty-state line rather than nothing.
pub fn render_entries<'a>(
    execution_id: &str,
    entries: impl IntoIterator<Item = &'a LogEntry>,
    color: bool,
) -> String {
    let mut out = String::new();
    for entry in entries {
        let level = format!("{:<7}", entry.level.to_string().to_uppercase());
        let level = if color {
            match entry.level {
                LogLevel::Debug => level.dimmed().to_string(),
                LogLevel::Info => level.green().to_string(),
                LogLevel::Warning => level.yellow().to_string(),
                LogLevel::Error => level.red().to_string(),
            }
        } else {
            level
        };
        let _ = write!(
            out,
            "{} {}",
            entry.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            level
        );
        if let Some(node) = &entry.node_id {
            let _ = write!(out, " [{node}]");
        }
        let _ = write!(out, " {}", entry.message);
        if let Some(details) = &entry.details {
            let _ = write!(out, " {details}");
        }
        out.push('\n');
    }
    if out.is_empty() {
        let _ = writeln!(out, "No logs available for execution {execution_id}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(secs: i64, level: LogLevel, msg: &str, node: Option<&str>) -> LogEntry {
        LogEntry {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            level,
            message: msg.into(),
            node_id: node.map(String::from),
            details: None,
        }
    }

    #[test]
    fn test_empty_state() {
        let stream = LogStream::new("exec:abc");
        assert!(stream.is_empty());
        assert_eq!(stream.render(false), "No logs available for execution exec:abc\n");
    }

    #[test]
    fn test_keeps_arrival_order_and_duplicates() {
        let mut stream = LogStream::new("exec:1");
        stream.append(entry(5, LogLevel::Info, "late", None));
        stream.append(entry(1, LogLevel::Info, "early", None));
        stream.append(entry(1, LogLevel::Info, "early", None));

        let messages: Vec<_> = stream.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["late", "early", "early"]);
    }

    #[test]
    fn test_filters() {
        let mut stream = LogStream::new("exec:1");
        stream.append(entry(0, LogLevel::Debug, "plan", None));
        stream.append(entry(1, LogLevel::Info, "start", Some("a")));
        stream.append(entry(2, LogLevel::Error, "boom", Some("b")));
        stream.append(entry(3, LogLevel::Warning, "skip", Some("a")));

        assert_eq!(stream.for_node("a").count(), 2);
        let severe: Vec<_> = stream.at_least(LogLevel::Warning).map(|e| e.message.as_str()).collect();
        assert_eq!(severe, vec!["boom", "skip"]);
    }

    #[test]
    fn test_render_plain() {
        let mut stream = LogStream::new("exec:1");
        stream.append(entry(0, LogLevel::Info, "Node started", Some("parse-1")));
        stream.append(
            entry(1, LogLevel::Warning, "Output type differs", None)
                .with_details(serde_json::json!({"port": "ast"})),
        );
        insta::assert_snapshot!(stream.render(false), @r###"
        2023-11-14T22:13:20.000Z INFO    [parse-1] Node started
        2023-11-14T22:13:21.000Z WARNING Output type differs {"port":"ast"}
        "###);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Typed access to projects, functions, flows and logs
//!
//! Consumers read through `FlowClient` so that a local workspace and a
//! remote backend are interchangeable.

use crate::error::FlowError;
use crate::logs::LogStream;
use crate::store::Workspace;
use crate::types::{Flow, Function, LogEntry, Project};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Read-side interface over flow data
pub trait FlowClient {
    /// All projects
    fn fetch_projects(&self) -> Result<Vec<Project>>;
    /// All registered functions
    fn fetch_functions(&self) -> Result<Vec<Function>>;
    /// One flow by ID
    fn fetch_flow(&self, id: &str) -> Result<Flow>;
    /// The log stream of one execution
    fn fetch_logs(&self, execution_id: &str) -> Result<LogStream>;
}

impl FlowClient for Workspace {
    fn fetch_projects(&self) -> Result<Vec<Project>> {
        Ok(self.store.projects.clone())
    }

    fn fetch_functions(&self) -> Result<Vec<Function>> {
        Ok(self.store.functions.clone())
    }

    fn fetch_flow(&self, id: &str) -> Result<Flow> {
        self.flow(id)
            .cloned()
            .ok_or_else(|| FlowError::FlowNotFound(id.to_string()).into())
    }

    fn fetch_logs(&self, execution_id: &str) -> Result<LogStream> {
        Ok(self.logs(execution_id)?)
    }
}

/// Client for a remote flow backend speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    http: Client,
}

impl HttpClient {
    /// Create a client rooted at `base_url` (e.g. `https://host/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("flowdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Full URL for an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.http
            .get(&url)
            .send()
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Request to {url} was rejected"))?
            .json()
            .with_context(|| format!("Failed to decode response from {url}"))
    }
}

impl FlowClient for HttpClient {
    fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.get("projects")
    }

    fn fetch_functions(&self) -> Result<Vec<Function>> {
        self.get("functions")
    }

    fn fetch_flow(&self, id: &str) -> Result<Flow> {
        self.get(&format!("flows/{id}"))
    }

    fn fetch_logs(&self, execution_id: &str) -> Result<LogStream> {
        let entries: Vec<LogEntry> = self.get(&format!("executions/{execution_id}/logs"))?;
        Ok(LogStream::from_entries(execution_id, entries))
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Workspace persistence: projects, functions, flows and executions

use crate::error::FlowError;
use crate::graph::FlowGraph;
use crate::logs::LogStream;
use crate::types::{Execution, ExecutionStore, Flow, Function, Project, WorkspaceStore};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;

const WORKSPACE_FILE: &str = "workspace.json";
const EXECUTIONS_FILE: &str = "executions.json";

/// Everything a data directory holds
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    /// Projects, functions and flows
    pub store: WorkspaceStore,
    /// Execution history
    pub history: ExecutionStore,
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

impl Workspace {
    /// An empty workspace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a workspace from a directory containing workspace.json and executions.json
    pub fn load(dir: &Path) -> Result<Self> {
        let store: WorkspaceStore = read_json(&dir.join(WORKSPACE_FILE))?;
        let history: ExecutionStore = read_json(&dir.join(EXECUTIONS_FILE))?;
        debug!(
            dir = %dir.display(),
            flows = store.flows.len(),
            executions = history.executions.len(),
            "loaded workspace"
        );
        Ok(Self { store, history })
    }

    /// Save the workspace to a directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let workspace_path = dir.join(WORKSPACE_FILE);
        let executions_path = dir.join(EXECUTIONS_FILE);

        let workspace_json = serde_json::to_string_pretty(&self.store)
            .context("Failed to serialize workspace")?;
        fs::write(&workspace_path, workspace_json)
            .with_context(|| format!("Failed to write {}", workspace_path.display()))?;

        let executions_json = serde_json::to_string_pretty(&self.history)
            .context("Failed to serialize executions")?;
        fs::write(&executions_path, executions_json)
            .with_context(|| format!("Failed to write {}", executions_path.display()))?;

        Ok(())
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Add or replace a project
    pub fn add_project(&mut self, project: Project) {
        if let Some(existing) = self.store.projects.iter_mut().find(|p| p.id == project.id) {
            *existing = project;
        } else {
            self.store.projects.push(project);
        }
    }

    /// Get a project by ID
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.store.projects.iter().find(|p| p.id == id)
    }

    /// Remove a project; flows that referenced it are detached
    pub fn remove_project(&mut self, id: &str) -> Result<Project, FlowError> {
        let pos = self
            .store
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| FlowError::ProjectNotFound(id.to_string()))?;
        for flow in &mut self.store.flows {
            if flow.project_id.as_deref() == Some(id) {
                flow.project_id = None;
            }
        }
        Ok(self.store.projects.remove(pos))
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Add or replace a function
    pub fn add_function(&mut self, function: Function) {
        if let Some(existing) = self.store.functions.iter_mut().find(|f| f.id == function.id) {
            *existing = function;
        } else {
            self.store.functions.push(function);
        }
    }

    /// Get a function by ID
    #[must_use]
    pub fn function(&self, id: &str) -> Option<&Function> {
        self.store.functions.iter().find(|f| f.id == id)
    }

    /// All registered functions
    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.store.functions
    }

    /// Remove a function. Nodes already wrapping it are left untouched.
    pub fn remove_function(&mut self, id: &str) -> Result<Function, FlowError> {
        let pos = self
            .store
            .functions
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| FlowError::FunctionNotFound(id.to_string()))?;
        Ok(self.store.functions.remove(pos))
    }

    // =========================================================================
    // Flows
    // =========================================================================

    /// Add or replace a flow
    pub fn add_flow(&mut self, flow: Flow) {
        if let Some(existing) = self.store.flows.iter_mut().find(|f| f.id == flow.id) {
            *existing = flow;
        } else {
            self.store.flows.push(flow);
        }
    }

    /// Get a flow by ID
    #[must_use]
    pub fn flow(&self, id: &str) -> Option<&Flow> {
        self.store.flows.iter().find(|f| f.id == id)
    }

    /// Remove a flow
    pub fn remove_flow(&mut self, id: &str) -> Result<Flow, FlowError> {
        let pos = self
            .store
            .flows
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| FlowError::FlowNotFound(id.to_string()))?;
        Ok(self.store.flows.remove(pos))
    }

    /// Check out a flow for editing
    pub fn graph(&self, flow_id: &str) -> Result<FlowGraph, FlowError> {
        self.flow(flow_id)
            .cloned()
            .map(FlowGraph::from_flow)
            .ok_or_else(|| FlowError::FlowNotFound(flow_id.to_string()))
    }

    /// Check an edited flow back in
    pub fn put_graph(&mut self, graph: FlowGraph) {
        self.add_flow(graph.into_flow());
    }

    // =========================================================================
    // Executions
    // =========================================================================

    /// Record a finished execution
    pub fn record_execution(&mut self, execution: Execution) {
        self.history.executions.push(execution);
    }

    /// Get an execution by ID
    #[must_use]
    pub fn execution(&self, id: &str) -> Option<&Execution> {
        self.history.executions.iter().find(|e| e.id == id)
    }

    /// Executions of one flow, oldest first
    #[must_use]
    pub fn executions_of(&self, flow_id: &str) -> Vec<&Execution> {
        self.history
            .executions
            .iter()
            .filter(|e| e.flow_id == flow_id)
            .collect()
    }

    /// The log stream of an execution
    pub fn logs(&self, execution_id: &str) -> Result<LogStream, FlowError> {
        self.execution(execution_id)
            .map(|e| LogStream::from_entries(&e.id, e.logs.clone()))
            .ok_or_else(|| FlowError::ExecutionNotFound(execution_id.to_string()))
    }
}

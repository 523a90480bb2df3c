// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! The flow graph controller
//!
//! `FlowGraph` owns one flow's nodes and edges and is the only thing that
//! mutates them. Every mutation keeps the petgraph index in sync with the
//! flow so that structural queries stay cheap.

use crate::error::FlowError;
use crate::types::{Edge, Flow, Mapping, Node, Position};
use crate::validate::{self, ValidationReport};
use anyhow::{Context, Result};
use chrono::Utc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tracing::debug;

/// What `FlowGraph::connect` did with an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connected {
    /// A new edge was added
    Created,
    /// The edge existed and its mappings were replaced
    Updated,
    /// The edge existed with the same mappings
    Unchanged,
}

/// A flow with a petgraph backing for structural queries
#[derive(Debug, Clone)]
pub struct FlowGraph {
    /// The underlying directed graph (weights are node / edge ids)
    graph: DiGraph<String, String>,
    /// Map from node ID to node index
    node_indices: HashMap<String, NodeIndex>,
    /// The flow being edited
    flow: Flow,
}

impl FlowGraph {
    /// Create a controller for an empty flow
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::from_flow(Flow::new(name))
    }

    /// Take ownership of an existing flow.
    ///
    /// The flow is indexed as-is; call `validate` to find problems in it.
    #[must_use]
    pub fn from_flow(flow: Flow) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            flow,
        };
        graph.rebuild_graph();
        graph
    }

    /// Rebuild the petgraph from the flow
    fn rebuild_graph(&mut self) {
        self.graph.clear();
        self.node_indices.clear();

        for node in &self.flow.nodes {
            let idx = self.graph.add_node(node.id.clone());
            self.node_indices.insert(node.id.clone(), idx);
        }

        for edge in &self.flow.edges {
            if let (Some(&from_idx), Some(&to_idx)) = (
                self.node_indices.get(&edge.source),
                self.node_indices.get(&edge.target),
            ) {
                self.graph.add_edge(from_idx, to_idx, edge.id.clone());
            }
        }
    }

    fn touch(&mut self) {
        self.flow.updated_at = Some(Utc::now());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The flow being edited
    #[must_use]
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// Give the flow back
    #[must_use]
    pub fn into_flow(self) -> Flow {
        self.flow
    }

    /// Flow ID
    #[must_use]
    pub fn id(&self) -> &str {
        &self.flow.id
    }

    /// Get a node by ID
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.flow.nodes.iter().find(|n| n.id == id)
    }

    /// Get an edge by ID
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.flow.edges.iter().find(|e| e.id == id)
    }

    /// Get all nodes
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.flow.nodes
    }

    /// Get all edges
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.flow.edges
    }

    /// Get edges leaving a node
    #[must_use]
    pub fn edges_from(&self, node_id: &str) -> Vec<&Edge> {
        self.flow.edges.iter().filter(|e| e.source == node_id).collect()
    }

    /// Get edges entering a node
    #[must_use]
    pub fn edges_to(&self, node_id: &str) -> Vec<&Edge> {
        self.flow.edges.iter().filter(|e| e.target == node_id).collect()
    }

    /// IDs of the nodes directly downstream of `node_id`
    #[must_use]
    pub fn successors(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    /// IDs of the nodes directly upstream of `node_id`
    #[must_use]
    pub fn predecessors(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Incoming)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.flow.nodes.len()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.flow.edges.len()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flow.nodes.is_empty()
    }

    /// Smallest unused id of the form `<prefix>-<n>`
    #[must_use]
    pub fn next_node_id(&self, prefix: &str) -> String {
        (1..)
            .map(|n| format!("{prefix}-{n}"))
            .find(|id| !self.node_indices.contains_key(id))
            .unwrap_or_else(|| prefix.to_string())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a node. Its port names must be unique on each side.
    pub fn add_node(&mut self, node: Node) -> Result<(), FlowError> {
        if self.node_indices.contains_key(&node.id) {
            return Err(FlowError::DuplicateNode(node.id));
        }
        validate::check_node(&node)?;

        debug!(node = %node.id, "adding node");
        let idx = self.graph.add_node(node.id.clone());
        self.node_indices.insert(node.id.clone(), idx);
        self.flow.nodes.push(node);
        self.touch();
        Ok(())
    }

    /// Remove a node and every edge touching it, returning the removed edges
    pub fn remove_node(&mut self, id: &str) -> Result<Vec<Edge>, FlowError> {
        if !self.node_indices.contains_key(id) {
            return Err(FlowError::NodeNotFound(id.to_string()));
        }

        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.flow.edges)
            .into_iter()
            .partition(|e| e.source == id || e.target == id);
        self.flow.edges = kept;
        self.flow.nodes.retain(|n| n.id != id);

        // Removing from a petgraph shifts indices, so rebuild instead.
        self.rebuild_graph();
        self.touch();
        debug!(node = %id, edges = removed.len(), "removed node");
        Ok(removed)
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), FlowError> {
        let node = self
            .flow
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FlowError::NodeNotFound(id.to_string()))?;
        node.position = position;
        self.touch();
        Ok(())
    }

    /// Rename a node's display name
    pub fn rename_node(&mut self, id: &str, name: &str) -> Result<(), FlowError> {
        let node = self
            .flow
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FlowError::NodeNotFound(id.to_string()))?;
        node.data.name = name.to_string();
        self.touch();
        Ok(())
    }

    /// Connect two nodes.
    ///
    /// The edge must pass `validate::check_edge`. An edge whose ID is already
    /// present has its mappings replaced through `set_mappings`. Cycles are
    /// allowed while editing and are caught by `validate` and `execution_order`.
    pub fn connect(&mut self, edge: Edge) -> Result<Connected, FlowError> {
        if let Some(existing) = self.edge(&edge.id) {
            if existing.data.mappings == edge.data.mappings {
                return Ok(Connected::Unchanged);
            }
            self.set_mappings(&edge.id, edge.data.mappings)?;
            return Ok(Connected::Updated);
        }

        let source = self
            .node(&edge.source)
            .ok_or_else(|| FlowError::NodeNotFound(edge.source.clone()))?;
        let target = self
            .node(&edge.target)
            .ok_or_else(|| FlowError::NodeNotFound(edge.target.clone()))?;
        validate::check_edge(source, target, &edge)?;

        let from_idx = self.node_indices[&edge.source];
        let to_idx = self.node_indices[&edge.target];
        debug!(edge = %edge.id, from = %edge.source, to = %edge.target, "connecting");
        self.graph.add_edge(from_idx, to_idx, edge.id.clone());
        self.flow.edges.push(edge);
        self.touch();
        Ok(Connected::Created)
    }

    /// Remove an edge by ID
    pub fn disconnect(&mut self, edge_id: &str) -> Result<Edge, FlowError> {
        let pos = self
            .flow
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| FlowError::EdgeNotFound(edge_id.to_string()))?;
        let edge = self.flow.edges.remove(pos);
        if let Some(idx) = self.graph.edge_indices().find(|&i| self.graph[i] == edge_id) {
            self.graph.remove_edge(idx);
        }
        self.touch();
        Ok(edge)
    }

    /// Replace an edge's mappings after checking them against its endpoints
    pub fn set_mappings(&mut self, edge_id: &str, mappings: Vec<Mapping>) -> Result<(), FlowError> {
        let pos = self
            .flow
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| FlowError::EdgeNotFound(edge_id.to_string()))?;

        let candidate = self.flow.edges[pos].clone().with_mappings(mappings);
        let source = self
            .node(&candidate.source)
            .ok_or_else(|| FlowError::NodeNotFound(candidate.source.clone()))?;
        let target = self
            .node(&candidate.target)
            .ok_or_else(|| FlowError::NodeNotFound(candidate.target.clone()))?;
        validate::check_edge(source, target, &candidate)?;

        self.flow.edges[pos] = candidate;
        self.touch();
        Ok(())
    }

    // =========================================================================
    // Validation and ordering
    // =========================================================================

    /// Collect every violation in the flow
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        validate::validate_flow(&self.flow)
    }

    /// Nodes in an order where every edge points forward
    pub fn execution_order(&self) -> Result<Vec<&Node>, FlowError> {
        let order = validate::topological_order(&self.flow)?;
        Ok(order.iter().filter_map(|id| self.node(id)).collect())
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = format!("digraph \"{}\" {{\n", escape(&self.flow.id));
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=record];\n\n");

        for node in &self.flow.nodes {
            let inputs: Vec<String> = node
                .data
                .inputs
                .iter()
                .map(|p| format!("<in_{0}> {0}: {1}", record_escape(&p.name), p.port_type))
                .collect();
            let outputs: Vec<String> = node
                .data
                .outputs
                .iter()
                .map(|p| format!("<out_{0}> {0}: {1}", record_escape(&p.name), p.port_type))
                .collect();
            dot.push_str(&format!(
                "  \"{}\" [label=\"{{{{{}}}|{}|{{{}}}}}\"];\n",
                escape(&node.id),
                inputs.join("|"),
                record_escape(&node.data.name),
                outputs.join("|")
            ));
        }

        if !self.flow.edges.is_empty() {
            dot.push('\n');
        }

        for edge in &self.flow.edges {
            let label = edge
                .data
                .mappings
                .iter()
                .map(|m| {
                    let (source, target) = (escape(&m.source), escape(&m.target));
                    match &m.transform {
                        Some(t) => format!("{source}→{target} ({}→{})", t.config.from, t.config.to),
                        None => format!("{source}→{target}"),
                    }
                })
                .collect::<Vec<_>>()
                .join("\\n");
            dot.push_str(&format!(
                "  \"{}\":\"out_{}\" -> \"{}\":\"in_{}\" [label=\"{}\"];\n",
                escape(&edge.source),
                escape(&edge.source_handle),
                escape(&edge.target),
                escape(&edge.target_handle),
                label
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.flow).context("Failed to serialize flow to JSON")
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape text inside a record label, where `{}|<>` delimit fields
fn record_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '"' | '{' | '}' | '|' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

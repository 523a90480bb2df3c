// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Connection and whole-graph validation
//!
//! `check_connection` decides whether a single output -> input pairing is
//! legal. `check_edge` applies it to every effective mapping of an edge,
//! and `validate_flow` collects every violation in a flow.

use crate::error::FlowError;
use crate::types::{Edge, Flow, Mapping, Node, PortDirection, PortType, Transform};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Decide whether a value of `source` type may feed a `target` port.
///
/// A supplied transform must declare exactly `source -> target`. Without a
/// transform the types must be identical, or one side must be `any`.
pub fn check_connection(
    source: PortType,
    target: PortType,
    transform: Option<&Transform>,
) -> Result<(), FlowError> {
    let ok = match transform {
        Some(t) => t.config.from == source && t.config.to == target,
        None => source.accepts_into(target),
    };
    if ok {
        Ok(())
    } else {
        Err(FlowError::TypeMismatch {
            source_port: String::new(),
            target_port: String::new(),
            from: source,
            to: target,
            transform: transform.map(|t| (t.config.from, t.config.to)),
        })
    }
}

fn require_port<'n>(
    node: &'n Node,
    direction: PortDirection,
    name: &str,
) -> Result<&'n crate::types::Port, FlowError> {
    node.port(direction, name).ok_or_else(|| FlowError::UnknownPort {
        node_id: node.id.clone(),
        port: name.to_string(),
        direction,
    })
}

/// Check one mapping between two resolved nodes
pub fn check_mapping(source: &Node, target: &Node, mapping: &Mapping) -> Result<(), FlowError> {
    let out = require_port(source, PortDirection::Output, &mapping.source)?;
    let inp = require_port(target, PortDirection::Input, &mapping.target)?;
    check_connection(out.port_type, inp.port_type, mapping.transform.as_ref()).map_err(|e| match e {
        FlowError::TypeMismatch { from, to, transform, .. } => FlowError::TypeMismatch {
            source_port: format!("{}.{}", source.id, out.name),
            target_port: format!("{}.{}", target.id, inp.name),
            from,
            to,
            transform,
        },
        other => other,
    })
}

/// Check an edge against its endpoint nodes.
///
/// Rejects self-loops, dangling handles, and any effective mapping that
/// fails `check_mapping`.
pub fn check_edge(source: &Node, target: &Node, edge: &Edge) -> Result<(), FlowError> {
    if edge.source == edge.target {
        return Err(FlowError::InvalidConnection(format!(
            "edge '{}' connects node '{}' to itself",
            edge.id, edge.source
        )));
    }
    require_port(source, PortDirection::Output, &edge.source_handle)?;
    require_port(target, PortDirection::Input, &edge.target_handle)?;
    for mapping in edge.effective_mappings() {
        check_mapping(source, target, &mapping)?;
    }
    Ok(())
}

/// Check that port names are unique on each side of a node
pub fn check_node(node: &Node) -> Result<(), FlowError> {
    for (direction, ports) in [
        (PortDirection::Input, &node.data.inputs),
        (PortDirection::Output, &node.data.outputs),
    ] {
        let mut seen = HashSet::new();
        for port in ports {
            if !seen.insert(port.name.as_str()) {
                return Err(FlowError::DuplicatePort {
                    node_id: node.id.clone(),
                    port: port.name.clone(),
                    direction,
                });
            }
        }
    }
    Ok(())
}

// =============================================================================
// Whole-graph validation
// =============================================================================

/// Where a violation was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The flow as a whole
    Flow,
    /// A node by ID
    Node(String),
    /// An edge by ID
    Edge(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flow => f.write_str("flow"),
            Self::Node(id) => write!(f, "node {id}"),
            Self::Edge(id) => write!(f, "edge {id}"),
        }
    }
}

/// One problem found in a flow
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// What the problem is attached to
    pub subject: Subject,
    /// The problem
    pub error: FlowError,
}

/// Every violation found in a flow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Violations in discovery order: nodes, edges, input conflicts, cycles
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// True when nothing was found
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Turn the report into a result carrying the first violation
    pub fn into_result(self) -> Result<(), FlowError> {
        match self.violations.into_iter().next() {
            Some(v) => Err(v.error),
            None => Ok(()),
        }
    }

    fn push(&mut self, subject: Subject, error: FlowError) {
        self.violations.push(Violation { subject, error });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("Flow is valid");
        }
        writeln!(f, "{} violation(s):", self.violations.len())?;
        for v in &self.violations {
            writeln!(f, "  [{}] {}", v.subject, v.error)?;
        }
        Ok(())
    }
}

/// Validate every node and edge of a flow and check it is acyclic
#[must_use]
pub fn validate_flow(flow: &Flow) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut nodes: HashMap<&str, &Node> = HashMap::new();

    for node in &flow.nodes {
        if nodes.insert(node.id.as_str(), node).is_some() {
            report.push(Subject::Node(node.id.clone()), FlowError::DuplicateNode(node.id.clone()));
        }
        if let Err(e) = check_node(node) {
            report.push(Subject::Node(node.id.clone()), e);
        }
    }

    let mut bound_inputs: HashMap<(&str, String), usize> = HashMap::new();
    for edge in &flow.edges {
        let subject = || Subject::Edge(edge.id.clone());
        let (Some(source), Some(target)) = (
            nodes.get(edge.source.as_str()),
            nodes.get(edge.target.as_str()),
        ) else {
            let missing = if nodes.contains_key(edge.source.as_str()) {
                &edge.target
            } else {
                &edge.source
            };
            report.push(subject(), FlowError::NodeNotFound(missing.clone()));
            continue;
        };
        if let Err(e) = check_edge(source, target, edge) {
            report.push(subject(), e);
            continue;
        }
        for mapping in edge.effective_mappings() {
            *bound_inputs
                .entry((edge.target.as_str(), mapping.target))
                .or_default() += 1;
        }
    }

    let mut conflicts: Vec<_> = bound_inputs
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((node_id, port), _)| (node_id, port))
        .collect();
    conflicts.sort();
    for (node_id, port) in conflicts {
        report.push(
            Subject::Node(node_id.to_string()),
            FlowError::InputConflict {
                node_id: node_id.to_string(),
                port,
            },
        );
    }

    if let Err(e) = topological_order(flow) {
        report.push(Subject::Flow, e);
    }

    report
}

/// Order node IDs so every edge points forward.
///
/// Edges whose endpoints are missing are ignored here; `validate_flow`
/// reports them separately.
pub fn topological_order(flow: &Flow) -> Result<Vec<String>, FlowError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
    for node in &flow.nodes {
        indices
            .entry(node.id.as_str())
            .or_insert_with(|| graph.add_node(node.id.as_str()));
    }
    for edge in &flow.edges {
        if let (Some(&from), Some(&to)) = (
            indices.get(edge.source.as_str()),
            indices.get(edge.target.as_str()),
        ) {
            graph.add_edge(from, to, ());
        }
    }
    toposort(&graph, None)
        .map(|order| order.into_iter().map(|idx| graph[idx].to_string()).collect())
        .map_err(|cycle| FlowError::CyclicGraph {
            node_id: graph[cycle.node_id()].to_string(),
        })
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Domain errors for flow editing, validation and execution

use crate::types::{PortDirection, PortType};
use thiserror::Error;

/// Errors raised by the flow graph model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Port types are incompatible and no matching transform bridges them
    #[error("Type mismatch: {source_port} ({from}) cannot feed {target_port} ({to}){}", describe_transform(.transform))]
    TypeMismatch {
        /// Output port name
        source_port: String,
        /// Input port name
        target_port: String,
        /// Output port type
        from: PortType,
        /// Input port type
        to: PortType,
        /// Declared transform, when one was supplied but did not fit
        transform: Option<(PortType, PortType)>,
    },

    /// The connection is structurally illegal (e.g. a self-loop)
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// A handle or mapping names a port the node does not have
    #[error("Node '{node_id}' has no {direction} port named '{port}'")]
    UnknownPort {
        /// Node ID
        node_id: String,
        /// Missing port name
        port: String,
        /// Side that was searched
        direction: PortDirection,
    },

    /// Two ports on the same side of a node share a name
    #[error("Node '{node_id}' declares {direction} port '{port}' more than once")]
    DuplicatePort {
        /// Node ID
        node_id: String,
        /// Repeated port name
        port: String,
        /// Side of the node
        direction: PortDirection,
    },

    /// Node ID not present in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Node ID already taken
    #[error("Node already exists: {0}")]
    DuplicateNode(String),

    /// Edge ID not present in the graph
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// An input port is fed by more than one mapping
    #[error("Input '{port}' of node '{node_id}' is fed by more than one mapping")]
    InputConflict {
        /// Target node ID
        node_id: String,
        /// Input port name
        port: String,
    },

    /// The graph has a cycle and cannot be ordered for execution
    #[error("Flow graph has a cycle through node '{node_id}'")]
    CyclicGraph {
        /// A node on the cycle
        node_id: String,
    },

    /// A cast could not convert a value
    #[error("Cannot cast {value} to {to}")]
    TransformFailed {
        /// Rendered input value
        value: String,
        /// Requested type
        to: PortType,
    },

    /// Function ID not registered
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// Flow ID not present in the workspace
    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    /// Execution ID not present in the workspace
    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    /// Project ID not present in the workspace
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// A function runner reported a failure
    #[error("Node '{node_id}' failed: {message}")]
    NodeFailed {
        /// Node ID
        node_id: String,
        /// Runner message
        message: String,
    },
}

fn describe_transform(transform: &Option<(PortType, PortType)>) -> String {
    match transform {
        Some((from, to)) => format!(" through transform {from} -> {to}"),
        None => String::new(),
    }
}

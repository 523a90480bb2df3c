// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Flowdeck library - typed flow graphs for analysis pipelines
//!
//! This crate provides the flow graph model behind the pipeline editor:
//! nodes wrapping typed functions, edges carrying field mappings with
//! optional cast transforms, connection validation, topological execution
//! and append-only execution log streams.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod execution;
pub mod graph;
pub mod logs;
pub mod store;
pub mod transform;
pub mod validate;

/// Core data types shared by the editor, the validator and the executor
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};
    use sha2::{Digest, Sha256};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::str::FromStr;

    /// Turn a display name into an id-safe slug
    #[must_use]
    pub fn slug(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .trim_matches('-')
            .to_string()
    }

    // =========================================================================
    // Ports
    // =========================================================================

    /// The data type carried by a port
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum PortType {
        /// UTF-8 text
        String,
        /// Any JSON number
        Number,
        /// true / false
        Boolean,
        /// JSON array
        Array,
        /// JSON object
        Object,
        /// Accepts and produces anything
        Any,
    }

    impl PortType {
        /// All port types, in declaration order
        pub const ALL: [Self; 6] = [
            Self::String,
            Self::Number,
            Self::Boolean,
            Self::Array,
            Self::Object,
            Self::Any,
        ];

        /// Get the wire name of this type
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::String => "string",
                Self::Number => "number",
                Self::Boolean => "boolean",
                Self::Array => "array",
                Self::Object => "object",
                Self::Any => "any",
            }
        }

        /// Whether a value of type `self` can flow into a port of type `target`
        /// without a transform
        #[must_use]
        pub fn accepts_into(&self, target: PortType) -> bool {
            *self == target || *self == Self::Any || target == Self::Any
        }

        /// Classify a JSON value. `null` has no port type of its own.
        #[must_use]
        pub fn of_value(value: &Value) -> Option<Self> {
            match value {
                Value::Null => None,
                Value::Bool(_) => Some(Self::Boolean),
                Value::Number(_) => Some(Self::Number),
                Value::String(_) => Some(Self::String),
                Value::Array(_) => Some(Self::Array),
                Value::Object(_) => Some(Self::Object),
            }
        }

        /// Whether `value` conforms to this type (`null` conforms to everything)
        #[must_use]
        pub fn matches(&self, value: &Value) -> bool {
            match Self::of_value(value) {
                None => true,
                Some(actual) => actual.accepts_into(*self),
            }
        }

        /// The zero value produced for this type by a dry run
        #[must_use]
        pub fn zero_value(&self) -> Value {
            match self {
                Self::String => Value::String(String::new()),
                Self::Number => Value::from(0),
                Self::Boolean => Value::Bool(false),
                Self::Array => Value::Array(Vec::new()),
                Self::Object => Value::Object(Map::new()),
                Self::Any => Value::Null,
            }
        }
    }

    impl fmt::Display for PortType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for PortType {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_lowercase().as_str() {
                "string" | "str" | "text" => Ok(Self::String),
                "number" | "num" => Ok(Self::Number),
                "boolean" | "bool" => Ok(Self::Boolean),
                "array" | "list" => Ok(Self::Array),
                "object" | "map" => Ok(Self::Object),
                "any" => Ok(Self::Any),
                other => Err(format!(
                    "Unknown port type: {other}. Valid: string, number, boolean, array, object, any"
                )),
            }
        }
    }

    /// A named, typed input or output of a function or node
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Port {
        /// Port name, unique within its list
        pub name: String,
        /// Port data type
        #[serde(rename = "type")]
        pub port_type: PortType,
    }

    impl Port {
        /// Create a new port
        #[must_use]
        pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
            Self {
                name: name.into(),
                port_type,
            }
        }
    }

    /// Parses `name:type`
    impl FromStr for Port {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let (name, ty) = s
                .split_once(':')
                .ok_or_else(|| format!("Invalid port '{s}'. Expected name:type"))?;
            if name.trim().is_empty() {
                return Err(format!("Invalid port '{s}'. Port name is empty"));
            }
            Ok(Self::new(name.trim(), ty.parse()?))
        }
    }

    /// Which side of a node a port lives on
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PortDirection {
        /// An input port (edge target side)
        Input,
        /// An output port (edge source side)
        Output,
    }

    impl fmt::Display for PortDirection {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Input => f.write_str("input"),
                Self::Output => f.write_str("output"),
            }
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Language a function implementation is written in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CodeLanguage {
        /// Python source
        Python,
        /// JavaScript source
        Javascript,
        /// TypeScript source
        Typescript,
        /// SQL query
        Sql,
        /// Rust source
        Rust,
    }

    impl fmt::Display for CodeLanguage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let s = match self {
                Self::Python => "python",
                Self::Javascript => "javascript",
                Self::Typescript => "typescript",
                Self::Sql => "sql",
                Self::Rust => "rust",
            };
            f.write_str(s)
        }
    }

    impl FromStr for CodeLanguage {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "python" | "py" => Ok(Self::Python),
                "javascript" | "js" => Ok(Self::Javascript),
                "typescript" | "ts" => Ok(Self::Typescript),
                "sql" => Ok(Self::Sql),
                "rust" | "rs" => Ok(Self::Rust),
                other => Err(format!(
                    "Unknown language: {other}. Valid: python, javascript, typescript, sql, rust"
                )),
            }
        }
    }

    /// A unit of executable logic that nodes wrap
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Function {
        /// Unique identifier: fn:<slug>
        pub id: String,
        /// Display name
        pub name: String,
        /// Description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// Declared inputs
        #[serde(default)]
        pub inputs: Vec<Port>,
        /// Declared outputs
        #[serde(default)]
        pub outputs: Vec<Port>,
        /// Implementation language
        #[serde(alias = "codeLanguage")]
        pub code_language: CodeLanguage,
        /// Source text of the implementation
        #[serde(default)]
        pub implementation: String,
    }

    impl Function {
        /// Generate the id for a function name
        #[must_use]
        pub fn generate_id(name: &str) -> String {
            format!("fn:{}", slug(name))
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Position on the editor canvas
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct Position {
        /// X coordinate
        pub x: f64,
        /// Y coordinate
        pub y: f64,
    }

    /// Payload of a node
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NodeData {
        /// Display name
        pub name: String,
        /// Input ports
        #[serde(default)]
        pub inputs: Vec<Port>,
        /// Output ports
        #[serde(default)]
        pub outputs: Vec<Port>,
        /// Function this node wraps, if any
        #[serde(default, alias = "function_id", skip_serializing_if = "Option::is_none")]
        pub function_id: Option<String>,
    }

    fn default_node_type() -> String {
        "function".into()
    }

    /// A typed unit in a flow graph
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Node {
        /// Identifier, unique within the graph
        pub id: String,
        /// Editor node type
        #[serde(rename = "type", default = "default_node_type")]
        pub node_type: String,
        /// Canvas position
        #[serde(default)]
        pub position: Position,
        /// Ports and name
        pub data: NodeData,
    }

    impl Node {
        /// Create a node wrapping `function`, copying its ports
        #[must_use]
        pub fn from_function(id: impl Into<String>, function: &Function, position: Position) -> Self {
            Self {
                id: id.into(),
                node_type: default_node_type(),
                position,
                data: NodeData {
                    name: function.name.clone(),
                    inputs: function.inputs.clone(),
                    outputs: function.outputs.clone(),
                    function_id: Some(function.id.clone()),
                },
            }
        }

        /// Look up an input port by name
        #[must_use]
        pub fn input(&self, name: &str) -> Option<&Port> {
            self.data.inputs.iter().find(|p| p.name == name)
        }

        /// Look up an output port by name
        #[must_use]
        pub fn output(&self, name: &str) -> Option<&Port> {
            self.data.outputs.iter().find(|p| p.name == name)
        }

        /// Look up a port on the given side
        #[must_use]
        pub fn port(&self, direction: PortDirection, name: &str) -> Option<&Port> {
            match direction {
                PortDirection::Input => self.input(name),
                PortDirection::Output => self.output(name),
            }
        }
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Kinds of transform a mapping may apply
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TransformKind {
        /// Type cast between two port types
        Cast,
    }

    /// Declared source and target types of a transform
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransformConfig {
        /// Type the transform consumes
        pub from: PortType,
        /// Type the transform produces
        pub to: PortType,
    }

    /// A type coercion applied to a mapping
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Transform {
        /// Transform kind
        #[serde(rename = "type")]
        pub kind: TransformKind,
        /// Declared from/to types
        pub config: TransformConfig,
    }

    impl Transform {
        /// A cast from one port type to another
        #[must_use]
        pub fn cast(from: PortType, to: PortType) -> Self {
            Self {
                kind: TransformKind::Cast,
                config: TransformConfig { from, to },
            }
        }
    }

    /// Field-level correspondence between an output port and an input port
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Mapping {
        /// Output port name on the source node
        pub source: String,
        /// Input port name on the target node
        pub target: String,
        /// Optional coercion
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub transform: Option<Transform>,
    }

    impl Mapping {
        /// A plain mapping without transform
        #[must_use]
        pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
            Self {
                source: source.into(),
                target: target.into(),
                transform: None,
            }
        }

        /// Attach a transform
        #[must_use]
        pub fn with_transform(mut self, transform: Transform) -> Self {
            self.transform = Some(transform);
            self
        }
    }

    /// Edge payload
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EdgeData {
        /// Field mappings; empty means `sourceHandle -> targetHandle`
        #[serde(default)]
        pub mappings: Vec<Mapping>,
    }

    /// A directed connection from an output handle to an input handle
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Edge {
        /// Content-hash ID: edge:<hash of (source, sourceHandle, target, targetHandle)>
        pub id: String,
        /// Source node ID
        pub source: String,
        /// Target node ID
        pub target: String,
        /// Output port name on the source node
        #[serde(alias = "source_handle")]
        pub source_handle: String,
        /// Input port name on the target node
        #[serde(alias = "target_handle")]
        pub target_handle: String,
        /// Mappings
        #[serde(default)]
        pub data: EdgeData,
    }

    impl Edge {
        /// Generate a deterministic ID for an edge
        #[must_use]
        pub fn generate_id(source: &str, source_handle: &str, target: &str, target_handle: &str) -> String {
            let mut hasher = Sha256::new();
            hasher.update(source.as_bytes());
            hasher.update(b"\0");
            hasher.update(source_handle.as_bytes());
            hasher.update(b"\0");
            hasher.update(target.as_bytes());
            hasher.update(b"\0");
            hasher.update(target_handle.as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("edge:{}", &hash[..8])
        }

        /// Create an edge with a generated ID and no explicit mappings
        #[must_use]
        pub fn new(
            source: impl Into<String>,
            source_handle: impl Into<String>,
            target: impl Into<String>,
            target_handle: impl Into<String>,
        ) -> Self {
            let (source, source_handle) = (source.into(), source_handle.into());
            let (target, target_handle) = (target.into(), target_handle.into());
            Self {
                id: Self::generate_id(&source, &source_handle, &target, &target_handle),
                source,
                target,
                source_handle,
                target_handle,
                data: EdgeData::default(),
            }
        }

        /// Replace the mappings
        #[must_use]
        pub fn with_mappings(mut self, mappings: Vec<Mapping>) -> Self {
            self.data.mappings = mappings;
            self
        }

        /// The mappings this edge actually applies
        #[must_use]
        pub fn effective_mappings(&self) -> Vec<Mapping> {
            if self.data.mappings.is_empty() {
                vec![Mapping::new(&self.source_handle, &self.target_handle)]
            } else {
                self.data.mappings.clone()
            }
        }
    }

    // =========================================================================
    // Flows and Projects
    // =========================================================================

    /// A project groups flows
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Project {
        /// Unique identifier: project:<slug>
        pub id: String,
        /// Display name
        pub name: String,
        /// Description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// When created
        #[serde(alias = "created_at")]
        pub created_at: DateTime<Utc>,
    }

    impl Project {
        /// Generate the id for a project name
        #[must_use]
        pub fn generate_id(name: &str) -> String {
            format!("project:{}", slug(name))
        }
    }

    /// A named flow graph
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Flow {
        /// Unique identifier: flow:<slug>
        pub id: String,
        /// Display name
        pub name: String,
        /// Description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// Owning project
        #[serde(default, alias = "project_id", skip_serializing_if = "Option::is_none")]
        pub project_id: Option<String>,
        /// Nodes
        #[serde(default)]
        pub nodes: Vec<Node>,
        /// Edges
        #[serde(default)]
        pub edges: Vec<Edge>,
        /// Last modification
        #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
        pub updated_at: Option<DateTime<Utc>>,
    }

    impl Flow {
        /// Generate the id for a flow name
        #[must_use]
        pub fn generate_id(name: &str) -> String {
            format!("flow:{}", slug(name))
        }

        /// An empty flow
        #[must_use]
        pub fn new(name: &str) -> Self {
            Self {
                id: Self::generate_id(name),
                name: name.to_string(),
                description: None,
                project_id: None,
                nodes: Vec::new(),
                edges: Vec::new(),
                updated_at: None,
            }
        }
    }

    // =========================================================================
    // Executions and Logs
    // =========================================================================

    /// Severity of a log entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum LogLevel {
        /// Internal detail
        Debug,
        /// Normal progress
        Info,
        /// Something odd but recoverable
        Warning,
        /// A failure
        Error,
    }

    impl fmt::Display for LogLevel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let s = match self {
                Self::Debug => "debug",
                Self::Info => "info",
                Self::Warning => "warning",
                Self::Error => "error",
            };
            f.write_str(s)
        }
    }

    impl FromStr for LogLevel {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "debug" => Ok(Self::Debug),
                "info" => Ok(Self::Info),
                "warning" | "warn" => Ok(Self::Warning),
                "error" => Ok(Self::Error),
                other => Err(format!("Unknown log level: {other}. Valid: debug, info, warning, error")),
            }
        }
    }

    /// One entry of an execution log
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LogEntry {
        /// When the entry was produced
        pub timestamp: DateTime<Utc>,
        /// Severity
        pub level: LogLevel,
        /// Human-readable message
        pub message: String,
        /// Node the entry concerns
        #[serde(default, alias = "node_id", skip_serializing_if = "Option::is_none")]
        pub node_id: Option<String>,
        /// Structured detail
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub details: Option<Value>,
    }

    impl LogEntry {
        /// A new entry stamped with the current time
        #[must_use]
        pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
            Self {
                timestamp: Utc::now(),
                level,
                message: message.into(),
                node_id: None,
                details: None,
            }
        }

        /// Attach a node id
        #[must_use]
        pub fn for_node(mut self, node_id: impl Into<String>) -> Self {
            self.node_id = Some(node_id.into());
            self
        }

        /// Attach structured details
        #[must_use]
        pub fn with_details(mut self, details: Value) -> Self {
            self.details = Some(details);
            self
        }
    }

    /// Lifecycle state of an execution
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ExecutionStatus {
        /// Not started
        Pending,
        /// In progress
        Running,
        /// Every node ran
        Succeeded,
        /// A node failed
        Failed,
    }

    impl fmt::Display for ExecutionStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let s = match self {
                Self::Pending => "pending",
                Self::Running => "running",
                Self::Succeeded => "succeeded",
                Self::Failed => "failed",
            };
            f.write_str(s)
        }
    }

    /// Outputs of one node, by port name
    pub type PortValues = Map<String, Value>;

    /// One run of a flow
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Execution {
        /// Unique identifier: exec:<hash>
        pub id: String,
        /// Flow that was run
        #[serde(alias = "flow_id")]
        pub flow_id: String,
        /// Status
        pub status: ExecutionStatus,
        /// Start time
        #[serde(alias = "started_at")]
        pub started_at: DateTime<Utc>,
        /// End time
        #[serde(default, alias = "finished_at", skip_serializing_if = "Option::is_none")]
        pub finished_at: Option<DateTime<Utc>>,
        /// Outputs per node id
        #[serde(default)]
        pub outputs: BTreeMap<String, PortValues>,
        /// Log entries in arrival order
        #[serde(default)]
        pub logs: Vec<LogEntry>,
    }

    impl Execution {
        /// Generate a deterministic ID for an execution
        #[must_use]
        pub fn generate_id(flow_id: &str, started_at: &DateTime<Utc>) -> String {
            let mut hasher = Sha256::new();
            hasher.update(flow_id.as_bytes());
            hasher.update(started_at.to_rfc3339().as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("exec:{}", &hash[..12])
        }
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Persisted projects, functions and flows
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct WorkspaceStore {
        /// All projects
        #[serde(default)]
        pub projects: Vec<Project>,
        /// All functions
        #[serde(default)]
        pub functions: Vec<Function>,
        /// All flows
        #[serde(default)]
        pub flows: Vec<Flow>,
    }

    /// Persisted execution history
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ExecutionStore {
        /// All executions, oldest first
        #[serde(default)]
        pub executions: Vec<Execution>,
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn test_port_parse() {
            let port: Port = "entities:array".parse().unwrap();
            assert_eq!(port, Port::new("entities", PortType::Array));
            assert!("entities".parse::<Port>().is_err());
            assert!("x:float".parse::<Port>().is_err());
        }

        #[test]
        fn test_any_accepts_everything() {
            for ty in PortType::ALL {
                assert!(PortType::Any.accepts_into(ty));
                assert!(ty.accepts_into(PortType::Any));
            }
            assert!(!PortType::Array.accepts_into(PortType::String));
        }

        #[test]
        fn test_edge_deserializes_ui_shape() {
            let edge: Edge = serde_json::from_value(json!({
                "id": "e1",
                "source": "a",
                "target": "b",
                "sourceHandle": "entities",
                "targetHandle": "code",
                "data": { "mappings": [
                    { "source": "entities", "target": "code",
                      "transform": { "type": "cast", "config": { "from": "array", "to": "string" } } }
                ]}
            }))
            .unwrap();
            assert_eq!(edge.source_handle, "entities");
            assert_eq!(
                edge.data.mappings[0].transform,
                Some(Transform::cast(PortType::Array, PortType::String))
            );
        }

        #[test]
        fn test_effective_mappings_default_to_handles() {
            let edge = Edge::new("a", "out", "b", "in");
            assert_eq!(edge.effective_mappings(), vec![Mapping::new("out", "in")]);
        }

        #[test]
        fn test_slug() {
            assert_eq!(slug("Code Quality Scan!"), "code-quality-scan");
            assert_eq!(Function::generate_id("Parse AST"), "fn:parse-ast");
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::FlowError;
    pub use crate::execution::{DryRunner, Executor, FunctionRunner};
    pub use crate::graph::{Connected, FlowGraph};
    pub use crate::logs::LogStream;
    pub use crate::store::Workspace;
    pub use crate::types::*;
    pub use crate::validate::{check_connection, ValidationReport};
    pub use anyhow::{Context, Result};
}

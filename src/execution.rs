// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Flow execution
//!
//! The executor walks a validated flow in topological order. For each node
//! it gathers inputs from upstream outputs through the edges' mappings,
//! hands them to a `FunctionRunner`, and records every step in the
//! execution's log stream.

use crate::error::FlowError;
use crate::graph::FlowGraph;
use crate::logs::LogStream;
use crate::transform;
use crate::types::{
    Execution, ExecutionStatus, Function, LogEntry, LogLevel, Node, PortType, PortValues,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Runs the logic behind a node.
///
/// This is the boundary to whatever actually evaluates function
/// implementations.
pub trait FunctionRunner {
    /// Produce output port values for `node` given its resolved inputs
    fn run(
        &self,
        node: &Node,
        function: Option<&Function>,
        inputs: &PortValues,
    ) -> anyhow::Result<PortValues>;
}

/// Emits the zero value of every declared output port
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunner;

impl FunctionRunner for DryRunner {
    fn run(
        &self,
        node: &Node,
        _function: Option<&Function>,
        _inputs: &PortValues,
    ) -> anyhow::Result<PortValues> {
        Ok(node
            .data
            .outputs
            .iter()
            .map(|p| (p.name.clone(), p.port_type.zero_value()))
            .collect())
    }
}

/// Runs flows against a function registry and a runner
pub struct Executor<'a> {
    functions: HashMap<&'a str, &'a Function>,
    runner: &'a dyn FunctionRunner,
}

impl<'a> Executor<'a> {
    /// Create an executor
    pub fn new(functions: &'a [Function], runner: &'a dyn FunctionRunner) -> Self {
        Self {
            functions: functions.iter().map(|f| (f.id.as_str(), f)).collect(),
            runner,
        }
    }

    /// Execute `graph`.
    ///
    /// A flow that fails validation (including cycles) is refused with the
    /// first violation. Node failures do not return an error; they mark the
    /// execution `failed`, and every node downstream of the failure is skipped.
    pub fn execute(&self, graph: &FlowGraph) -> Result<Execution, FlowError> {
        graph.validate().into_result()?;
        let order = graph.execution_order()?;

        let started_at = Utc::now();
        let id = Execution::generate_id(graph.id(), &started_at);
        let mut logs = LogStream::new(&id);
        info!(execution = %id, flow = %graph.id(), nodes = order.len(), "starting execution");
        logs.append(
            LogEntry::now(LogLevel::Info, format!("Execution started for flow {}", graph.id()))
                .with_details(json!({ "nodes": order.len() })),
        );
        logs.append(LogEntry::now(
            LogLevel::Debug,
            format!(
                "Execution order: {}",
                order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>().join(" -> ")
            ),
        ));

        let mut outputs: BTreeMap<String, PortValues> = BTreeMap::new();
        let mut blocked: HashSet<&str> = HashSet::new();
        let mut failed = false;

        for node in order {
            if blocked.contains(node.id.as_str()) {
                logs.append(
                    LogEntry::now(LogLevel::Warning, "Skipped: an upstream node failed")
                        .for_node(&node.id),
                );
                blocked.extend(graph.successors(&node.id));
                continue;
            }

            match self.run_node(graph, node, &outputs, &mut logs) {
                Ok(values) => {
                    outputs.insert(node.id.clone(), values);
                }
                Err(e) => {
                    failed = true;
                    logs.append(LogEntry::now(LogLevel::Error, e.to_string()).for_node(&node.id));
                    blocked.extend(graph.successors(&node.id));
                }
            }
        }

        let status = if failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Succeeded
        };
        logs.append(LogEntry::now(
            if failed { LogLevel::Error } else { LogLevel::Info },
            format!("Execution finished: {status}"),
        ));
        info!(execution = %id, ?status, "execution finished");

        Ok(Execution {
            id,
            flow_id: graph.id().to_string(),
            status,
            started_at,
            finished_at: Some(Utc::now()),
            outputs,
            logs: logs.into_entries(),
        })
    }

    fn run_node(
        &self,
        graph: &FlowGraph,
        node: &Node,
        outputs: &BTreeMap<String, PortValues>,
        logs: &mut LogStream,
    ) -> Result<PortValues, FlowError> {
        let inputs = resolve_inputs(graph, node, outputs)?;

        for port in &node.data.inputs {
            if !inputs.contains_key(&port.name) {
                logs.append(
                    LogEntry::now(LogLevel::Debug, format!("Input '{}' is unbound", port.name))
                        .for_node(&node.id),
                );
            }
        }

        let function = match &node.data.function_id {
            Some(fid) => Some(
                *self
                    .functions
                    .get(fid.as_str())
                    .ok_or_else(|| FlowError::FunctionNotFound(fid.clone()))?,
            ),
            None => None,
        };

        logs.append(
            LogEntry::now(LogLevel::Info, format!("Running {}", node.data.name))
                .for_node(&node.id)
                .with_details(Value::Object(inputs.clone())),
        );
        debug!(node = %node.id, inputs = inputs.len(), "running node");

        let values = self
            .runner
            .run(node, function, &inputs)
            .map_err(|e| FlowError::NodeFailed {
                node_id: node.id.clone(),
                message: format!("{e:#}"),
            })?;

        for port in &node.data.outputs {
            match values.get(&port.name) {
                None => logs.append(
                    LogEntry::now(LogLevel::Warning, format!("Output '{}' was not produced", port.name))
                        .for_node(&node.id),
                ),
                Some(v) if !port.port_type.matches(v) => logs.append(
                    LogEntry::now(
                        LogLevel::Warning,
                        format!(
                            "Output '{}' declared {} but produced {}",
                            port.name,
                            port.port_type,
                            PortType::of_value(v).map_or("null", |t| t.as_str())
                        ),
                    )
                    .for_node(&node.id),
                ),
                Some(_) => {}
            }
        }

        logs.append(LogEntry::now(LogLevel::Info, "Completed").for_node(&node.id));
        Ok(values)
    }
}

/// Gather a node's inputs from the outputs of its upstream nodes
fn resolve_inputs(
    graph: &FlowGraph,
    node: &Node,
    outputs: &BTreeMap<String, PortValues>,
) -> Result<PortValues, FlowError> {
    let mut inputs = PortValues::new();
    for edge in graph.edges_to(&node.id) {
        let upstream = outputs.get(&edge.source);
        for mapping in edge.effective_mappings() {
            let value = upstream
                .and_then(|values| values.get(&mapping.source))
                .cloned()
                .unwrap_or(Value::Null);
            let value = match &mapping.transform {
                Some(t) => transform::apply(t, value)?,
                None => value,
            };
            inputs.insert(mapping.target, value);
        }
    }
    Ok(inputs)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Node commands - place, move and remove nodes in a flow

use super::{required, Options};
use crate::error::FlowError;
use crate::types::{slug, Node, Position};
use anyhow::Result;
use tracing::info;

/// Arguments for node commands
#[derive(Debug, Clone, Default)]
pub struct NodeArgs {
    /// Flow to edit
    pub flow: Option<String>,
    /// Function ID (add) or node ID (remove, move)
    pub target: Option<String>,
    /// Explicit node ID for add
    pub id: Option<String>,
    /// Canvas X coordinate
    pub x: Option<f64>,
    /// Canvas Y coordinate
    pub y: Option<f64>,
}

/// Run node command
pub fn run(opts: &Options, action: &str, args: NodeArgs) -> Result<()> {
    let flow_id = required(args.flow, "--flow")?;
    let mut workspace = opts.load_workspace()?;
    let mut graph = workspace.graph(&flow_id)?;

    match action {
        "add" | "create" => {
            let function_id = required(args.target, "Function id")?;
            let function = workspace
                .function(&function_id)
                .ok_or_else(|| FlowError::FunctionNotFound(function_id.clone()))?;

            let id = args
                .id
                .unwrap_or_else(|| graph.next_node_id(&slug(&function.name)));
            let position = Position {
                x: args.x.unwrap_or_default(),
                y: args.y.unwrap_or_default(),
            };
            graph.add_node(Node::from_function(&id, function, position))?;

            info!(flow = %flow_id, node = %id, "added node");
            println!("Added node: {id} ({})", function.name);
        }

        "remove" | "delete" | "rm" => {
            let id = required(args.target, "Node id")?;
            let removed = graph.remove_node(&id)?;
            println!("Removed node: {id}");
            if !removed.is_empty() {
                println!("  and {} connected edge(s)", removed.len());
            }
        }

        "move" | "mv" => {
            let id = required(args.target, "Node id")?;
            let (Some(x), Some(y)) = (args.x, args.y) else {
                anyhow::bail!("--x and --y are required");
            };
            graph.move_node(&id, Position { x, y })?;
            println!("Moved node: {id} to ({x}, {y})");
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: add, remove, move", other);
        }
    }

    workspace.put_graph(graph);
    opts.save_workspace(&workspace)
}

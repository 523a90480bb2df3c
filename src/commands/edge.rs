// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Edge management commands - connect and disconnect node ports

use super::{print_json, required, Options};
use crate::error::FlowError;
use crate::graph::{Connected, FlowGraph};
use crate::types::{Edge, Mapping, PortDirection, PortType, Transform};
use anyhow::Result;
use tracing::info;

/// Arguments for edge commands
#[derive(Debug, Clone, Default)]
pub struct EdgeArgs {
    /// Flow to edit
    pub flow: Option<String>,
    /// Source endpoint as `node.port`
    pub from: Option<String>,
    /// Target endpoint as `node.port`
    pub to: Option<String>,
    /// Field mappings as `out:in` or `out:in:cast`
    pub maps: Vec<String>,
    /// Edge ID for remove
    pub target: Option<String>,
}

/// Split `node.port`
fn parse_endpoint(s: &str) -> Result<(String, String)> {
    match s.split_once('.') {
        Some((node, port)) if !node.is_empty() && !port.is_empty() => {
            Ok((node.to_string(), port.to_string()))
        }
        _ => anyhow::bail!("Invalid endpoint '{}'. Expected node.port", s),
    }
}

/// Parse `out:in[:cast]`. A cast takes its types from the two ports.
fn parse_mapping(graph: &FlowGraph, source: &str, target: &str, spec: &str) -> Result<Mapping> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (out, inp, cast) = match parts.as_slice() {
        [out, inp] => (*out, *inp, false),
        [out, inp, "cast"] => (*out, *inp, true),
        _ => anyhow::bail!("Invalid mapping '{}'. Expected out:in or out:in:cast", spec),
    };
    let mapping = Mapping::new(out, inp);
    if !cast {
        return Ok(mapping);
    }

    let port_type = |node_id: &str, direction: PortDirection, port: &str| -> Result<PortType, FlowError> {
        let node = graph
            .node(node_id)
            .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))?;
        node.port(direction, port)
            .map(|p| p.port_type)
            .ok_or_else(|| FlowError::UnknownPort {
                node_id: node_id.to_string(),
                port: port.to_string(),
                direction,
            })
    };
    let from = port_type(source, PortDirection::Output, out)?;
    let to = port_type(target, PortDirection::Input, inp)?;
    Ok(mapping.with_transform(Transform::cast(from, to)))
}

fn describe(edge: &Edge) -> String {
    let mappings = edge
        .data
        .mappings
        .iter()
        .map(|m| match &m.transform {
            Some(t) => format!("{}->{} ({}->{})", m.source, m.target, t.config.from, t.config.to),
            None => format!("{}->{}", m.source, m.target),
        })
        .collect::<Vec<_>>();
    let suffix = if mappings.is_empty() {
        String::new()
    } else {
        format!(" [{}]", mappings.join(", "))
    };
    format!(
        "{}.{} -> {}.{}{}",
        edge.source, edge.source_handle, edge.target, edge.target_handle, suffix
    )
}

/// Run edge command
pub fn run(opts: &Options, action: &str, args: EdgeArgs) -> Result<()> {
    let flow_id = required(args.flow, "--flow")?;
    let mut workspace = opts.load_workspace()?;
    let mut graph = workspace.graph(&flow_id)?;

    match action {
        "add" | "create" | "connect" => {
            let (source, source_handle) = parse_endpoint(&required(args.from, "--from")?)?;
            let (target, target_handle) = parse_endpoint(&required(args.to, "--to")?)?;
            let mappings = args
                .maps
                .iter()
                .map(|m| parse_mapping(&graph, &source, &target, m))
                .collect::<Result<Vec<_>>>()?;

            let edge = Edge::new(&source, &source_handle, &target, &target_handle)
                .with_mappings(mappings);
            let edge_id = edge.id.clone();
            let outcome = graph.connect(edge)?;
            let stored = graph
                .edge(&edge_id)
                .ok_or_else(|| FlowError::EdgeNotFound(edge_id.clone()))?;
            let verb = match outcome {
                Connected::Created => "Created edge",
                Connected::Updated => "Updated edge",
                Connected::Unchanged => "Edge unchanged",
            };

            info!(flow = %flow_id, edge = %edge_id, ?outcome, "connected");
            println!("{verb}: {}", describe(stored));
            println!("  id: {edge_id}");
            if outcome == Connected::Unchanged {
                return Ok(());
            }
        }

        "remove" | "delete" | "rm" => {
            let edge_id = required(args.target, "Edge id")?;
            let removed = graph.disconnect(&edge_id)?;
            println!("Removed edge: {}", describe(&removed));
        }

        "list" | "ls" => {
            if opts.json {
                return print_json(graph.edges());
            }
            if graph.edges().is_empty() {
                println!("No edges defined. Use 'flowdeck edge add' to create one.");
                return Ok(());
            }
            println!("Edges ({}):", graph.edge_count());
            for edge in graph.edges() {
                println!("  {}  {}", edge.id, describe(edge));
            }
            return Ok(());
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: add, remove, list", other);
        }
    }

    workspace.put_graph(graph);
    opts.save_workspace(&workspace)
}

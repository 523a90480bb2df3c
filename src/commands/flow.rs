// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Flow commands - create, inspect and remove flows

use super::{print_json, required, Options};
use crate::error::FlowError;
use crate::types::Flow;
use anyhow::Result;
use chrono::Utc;
use tracing::info;

/// Run flow command
pub fn run(
    opts: &Options,
    action: &str,
    target: Option<String>,
    project: Option<String>,
    description: Option<String>,
) -> Result<()> {
    match action {
        "create" | "add" => {
            let name = required(target, "Flow name")?;
            let mut workspace = opts.load_workspace()?;

            let id = Flow::generate_id(&name);
            if workspace.flow(&id).is_some() {
                anyhow::bail!("Flow already exists: {}", id);
            }
            if let Some(p) = &project {
                if workspace.project(p).is_none() {
                    return Err(FlowError::ProjectNotFound(p.clone()).into());
                }
            }

            let mut flow = Flow::new(&name);
            flow.description = description;
            flow.project_id = project;
            flow.updated_at = Some(Utc::now());
            workspace.add_flow(flow);
            opts.save_workspace(&workspace)?;

            info!(flow = %id, "created flow");
            println!("Created flow: {name}");
            println!("  id: {id}");
        }

        "list" | "ls" => {
            let workspace = opts.load_workspace()?;
            let flows: Vec<&Flow> = workspace
                .store
                .flows
                .iter()
                .filter(|f| project.is_none() || f.project_id == project)
                .collect();
            if opts.json {
                return print_json(&flows);
            }
            if flows.is_empty() {
                println!("No flows defined. Use 'flowdeck flow create' to create one.");
                return Ok(());
            }
            println!("Flows ({}):", flows.len());
            for f in flows {
                let project = f.project_id.as_deref().unwrap_or("-");
                println!(
                    "  {} ({}) project={} nodes={} edges={}",
                    f.name,
                    f.id,
                    project,
                    f.nodes.len(),
                    f.edges.len()
                );
            }
        }

        "show" => {
            let id = required(target, "Flow id")?;
            let flow = opts.client()?.fetch_flow(&id)?;
            if opts.json {
                return print_json(&flow);
            }
            println!("{} ({})", flow.name, flow.id);
            if let Some(d) = &flow.description {
                println!("  {d}");
            }
            println!("Nodes ({}):", flow.nodes.len());
            for n in &flow.nodes {
                println!(
                    "  {} [{}] at ({}, {})",
                    n.id, n.data.name, n.position.x, n.position.y
                );
            }
            println!("Edges ({}):", flow.edges.len());
            for e in &flow.edges {
                println!(
                    "  {}.{} -> {}.{} ({})",
                    e.source, e.source_handle, e.target, e.target_handle, e.id
                );
            }
        }

        "remove" | "delete" | "rm" => {
            let id = required(target, "Flow id")?;
            let mut workspace = opts.load_workspace()?;
            let removed = workspace.remove_flow(&id)?;
            opts.save_workspace(&workspace)?;
            println!("Removed flow: {} ({})", removed.name, removed.id);
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: create, list, show, remove", other);
        }
    }

    Ok(())
}

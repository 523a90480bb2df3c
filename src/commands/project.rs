// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Project commands - group flows under named projects

use super::{print_json, required, Options};
use crate::types::Project;
use anyhow::Result;
use chrono::Utc;
use tracing::info;

/// Run project command
pub fn run(
    opts: &Options,
    action: &str,
    name: Option<String>,
    description: Option<String>,
) -> Result<()> {
    match action {
        "add" | "create" => {
            let name = required(name, "Project name")?;
            let mut workspace = opts.load_workspace()?;
            let project = Project {
                id: Project::generate_id(&name),
                name: name.clone(),
                description,
                created_at: Utc::now(),
            };
            let id = project.id.clone();
            workspace.add_project(project);
            opts.save_workspace(&workspace)?;

            info!(project = %id, "created project");
            println!("Created project: {name}");
            println!("  id: {id}");
        }

        "list" | "ls" => {
            let projects = opts.client()?.fetch_projects()?;
            if opts.json {
                return print_json(&projects);
            }
            if projects.is_empty() {
                println!("No projects defined. Use 'flowdeck project add' to create one.");
                return Ok(());
            }
            println!("Projects ({}):", projects.len());
            for p in &projects {
                match &p.description {
                    Some(d) => println!("  {} ({}) - {}", p.name, p.id, d),
                    None => println!("  {} ({})", p.name, p.id),
                }
            }
        }

        "remove" | "delete" | "rm" => {
            let id = required(name, "Project id")?;
            let mut workspace = opts.load_workspace()?;
            let removed = workspace.remove_project(&id)?;
            opts.save_workspace(&workspace)?;
            println!("Removed project: {} ({})", removed.name, removed.id);
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: add, list, remove", other);
        }
    }

    Ok(())
}

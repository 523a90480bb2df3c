// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Function commands - register the logic that nodes wrap

use super::{print_json, required, Options};
use crate::types::{CodeLanguage, Function, Port};
use anyhow::Result;
use tracing::info;

/// Arguments for `function add`
#[derive(Debug, Clone, Default)]
pub struct FunctionArgs {
    /// Input ports as `name:type`
    pub inputs: Vec<String>,
    /// Output ports as `name:type`
    pub outputs: Vec<String>,
    /// Implementation language
    pub language: Option<String>,
    /// Source text
    pub implementation: Option<String>,
    /// Description
    pub description: Option<String>,
}

fn parse_ports(specs: &[String]) -> Result<Vec<Port>> {
    let ports = specs
        .iter()
        .map(|s| s.parse::<Port>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::msg)?;
    for (i, p) in ports.iter().enumerate() {
        if ports[..i].iter().any(|q| q.name == p.name) {
            anyhow::bail!("Port '{}' is declared twice", p.name);
        }
    }
    Ok(ports)
}

fn format_ports(ports: &[Port]) -> String {
    if ports.is_empty() {
        return "-".to_string();
    }
    ports
        .iter()
        .map(|p| format!("{}: {}", p.name, p.port_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run function command
pub fn run(opts: &Options, action: &str, target: Option<String>, args: FunctionArgs) -> Result<()> {
    match action {
        "add" | "create" => {
            let name = required(target, "Function name")?;
            let code_language = match args.language.as_deref() {
                Some(l) => l.parse::<CodeLanguage>().map_err(anyhow::Error::msg)?,
                None => CodeLanguage::Python,
            };
            let function = Function {
                id: Function::generate_id(&name),
                name: name.clone(),
                description: args.description,
                inputs: parse_ports(&args.inputs)?,
                outputs: parse_ports(&args.outputs)?,
                code_language,
                implementation: args.implementation.unwrap_or_default(),
            };

            let mut workspace = opts.load_workspace()?;
            let id = function.id.clone();
            workspace.add_function(function);
            opts.save_workspace(&workspace)?;

            info!(function = %id, "registered function");
            println!("Registered function: {name}");
            println!("  id: {id}");
        }

        "list" | "ls" => {
            let functions = opts.client()?.fetch_functions()?;
            if opts.json {
                return print_json(&functions);
            }
            if functions.is_empty() {
                println!("No functions registered. Use 'flowdeck function add' to register one.");
                return Ok(());
            }
            println!("Functions ({}):", functions.len());
            for f in &functions {
                println!(
                    "  {} ({}) [{}] ({}) -> ({})",
                    f.name,
                    f.id,
                    f.code_language,
                    format_ports(&f.inputs),
                    format_ports(&f.outputs)
                );
            }
        }

        "show" => {
            let id = required(target, "Function id")?;
            let functions = opts.client()?.fetch_functions()?;
            let function = functions
                .iter()
                .find(|f| f.id == id)
                .ok_or_else(|| crate::error::FlowError::FunctionNotFound(id.clone()))?;
            if opts.json {
                return print_json(function);
            }
            println!("{} ({})", function.name, function.id);
            if let Some(d) = &function.description {
                println!("  {d}");
            }
            println!("  language: {}", function.code_language);
            println!("  inputs:   {}", format_ports(&function.inputs));
            println!("  outputs:  {}", format_ports(&function.outputs));
            if !function.implementation.is_empty() {
                println!();
                println!("{}", function.implementation);
            }
        }

        "remove" | "delete" | "rm" => {
            let id = required(target, "Function id")?;
            let mut workspace = opts.load_workspace()?;
            let removed = workspace.remove_function(&id)?;
            opts.save_workspace(&workspace)?;
            println!("Removed function: {} ({})", removed.name, removed.id);
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: add, list, show, remove", other);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortType;

    #[test]
    fn test_parse_ports() {
        let ports = parse_ports(&["code:string".into(), "n:number".into()]).unwrap();
        assert_eq!(ports[1], Port::new("n", PortType::Number));
        assert!(parse_ports(&["code".into()]).is_err());
        assert!(parse_ports(&["a:string".into(), "a:number".into()]).is_err());
    }
}

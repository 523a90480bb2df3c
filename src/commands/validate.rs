// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Validate command - report every problem in a flow

use super::{required, Options};
use anyhow::Result;
use serde_json::json;
use tracing::info;

/// Run the validate command. Fails when the flow has any violation.
pub fn run(opts: &Options, flow: Option<String>) -> Result<()> {
    let flow_id = required(flow, "--flow")?;
    let graph = opts.load_workspace()?.graph(&flow_id)?;
    let report = graph.validate();
    info!(flow = %flow_id, violations = report.violations.len(), "validated flow");

    if opts.json {
        let violations: Vec<_> = report
            .violations
            .iter()
            .map(|v| json!({ "subject": v.subject.to_string(), "error": v.error.to_string() }))
            .collect();
        super::print_json(&json!({
            "flow": flow_id,
            "valid": report.is_valid(),
            "violations": violations,
        }))?;
    } else {
        print!("{report}");
        if report.is_valid() {
            println!();
            let order = graph.execution_order()?;
            println!(
                "Execution order: {}",
                order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>().join(" -> ")
            );
        }
    }

    if !report.is_valid() {
        anyhow::bail!("Flow {} is invalid", flow_id);
    }
    Ok(())
}

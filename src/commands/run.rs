// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Run command - dry-run a flow and record the execution

use super::{print_json, required, Options};
use crate::execution::{DryRunner, Executor};
use crate::logs::render_entries;
use anyhow::Result;
use tracing::info;

/// Run the run command
pub fn run(opts: &Options, flow: Option<String>) -> Result<()> {
    let flow_id = required(flow, "--flow")?;
    let mut workspace = opts.load_workspace()?;
    let graph = workspace.graph(&flow_id)?;

    let execution = Executor::new(workspace.functions(), &DryRunner).execute(&graph)?;
    info!(execution = %execution.id, status = %execution.status, "recorded execution");

    if opts.json {
        print_json(&execution)?;
    } else {
        println!("Execution: {} ({})", execution.id, execution.status);
        print!("{}", render_entries(&execution.id, &execution.logs, opts.color));
    }

    workspace.record_execution(execution);
    opts.save_workspace(&workspace)
}

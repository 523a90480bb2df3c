// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod edge;
pub mod export;
pub mod flow;
pub mod function;
pub mod logs;
pub mod node;
pub mod project;
pub mod run;
pub mod validate;

use crate::client::{FlowClient, HttpClient};
use crate::store::Workspace;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Settings shared by every command, resolved from flags and config
#[derive(Debug, Clone)]
pub struct Options {
    /// Workspace directory
    pub data_dir: PathBuf,
    /// Config file the `config` command writes to
    pub config_path: PathBuf,
    /// Remote backend for read commands
    pub api_url: Option<String>,
    /// Print machine-readable JSON
    pub json: bool,
    /// Colored terminal output
    pub color: bool,
}

impl Options {
    /// Load the workspace from the data directory
    pub fn load_workspace(&self) -> Result<Workspace> {
        Workspace::load(&self.data_dir)
            .with_context(|| format!("Failed to load workspace from {}", self.data_dir.display()))
    }

    /// Save the workspace to the data directory
    pub fn save_workspace(&self, workspace: &Workspace) -> Result<()> {
        workspace
            .save(&self.data_dir)
            .with_context(|| format!("Failed to save workspace to {}", self.data_dir.display()))
    }

    /// Read-side client: the remote backend when `api_url` is set, else the local workspace
    pub fn client(&self) -> Result<Box<dyn FlowClient>> {
        match &self.api_url {
            Some(url) => Ok(Box::new(HttpClient::new(url)?)),
            None => Ok(Box::new(self.load_workspace()?)),
        }
    }
}

/// Print a value as pretty JSON
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

/// Unwrap a required positional or flag argument
pub(crate) fn required(value: Option<String>, what: &str) -> Result<String> {
    value.ok_or_else(|| anyhow::anyhow!("{} is required", what))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - read or write one configuration key

use super::Options;
use crate::config;
use anyhow::Result;
use tracing::info;

/// Print `key`, or write `key = value` to the config file
pub fn run(opts: &Options, key: &str, value: Option<String>) -> Result<()> {
    match value {
        Some(v) => {
            config::set(&opts.config_path, key, &v)?;
            info!(key, path = %opts.config_path.display(), "updated configuration");
            println!("Set {key} = {v}");
        }
        None => {
            let current = config::load(Some(opts.config_path.as_path()))?;
            println!("{}", config::get(&current, key)?);
        }
    }
    Ok(())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest precedence first: built-in defaults, the TOML config
//! file, then `FLOWDECK_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `flowdeck config`
pub const KEYS: [&str; 4] = ["data_dir", "log_level", "api_url", "color"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for persistent data (workspace, executions)
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of a remote flow backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Colored terminal output
    pub color: bool,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "hyperpolymath", "flowdeck")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".flowdeck")),
            log_level: "info".to_string(),
            api_url: None,
            color: true,
        }
    }
}

/// Default location of the config file
#[must_use]
pub fn default_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".flowdeck/config.toml"))
}

/// Load configuration, layering an optional file and the environment over defaults
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = Config::default();
    let path = path.map_or_else(default_path, Path::to_path_buf);

    let settings = ::config::Config::builder()
        .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
        .set_default("log_level", defaults.log_level)?
        .set_default("color", defaults.color)?
        .add_source(
            ::config::File::from(path.as_path())
                .format(::config::FileFormat::Toml)
                .required(false),
        )
        .add_source(::config::Environment::with_prefix("FLOWDECK"))
        .build()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    settings
        .try_deserialize()
        .context("Invalid configuration")
}

/// Read one key as a display string
pub fn get(config: &Config, key: &str) -> Result<String> {
    Ok(match key {
        "data_dir" => config.data_dir.display().to_string(),
        "log_level" => config.log_level.clone(),
        "api_url" => config.api_url.clone().unwrap_or_default(),
        "color" => config.color.to_string(),
        other => anyhow::bail!("Unknown config key: {}. Valid: {}", other, KEYS.join(", ")),
    })
}

/// Set one key in the config file at `path`, creating it if needed
pub fn set(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut table: toml::Table = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::Table::new()
    };

    let parsed = match key {
        "data_dir" | "log_level" | "api_url" => toml::Value::String(value.to_string()),
        "color" => toml::Value::Boolean(
            value
                .parse()
                .with_context(|| format!("color must be true or false, got '{value}'"))?,
        ),
        other => anyhow::bail!("Unknown config key: {}. Valid: {}", other, KEYS.join(", ")),
    };
    table.insert(key.to_string(), parsed);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&table).context("Failed to serialize configuration")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

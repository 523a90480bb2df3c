// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Flowdeck CLI - build, validate and dry-run typed flow graphs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use flowdeck::commands::{self, edge::EdgeArgs, function::FunctionArgs, node::NodeArgs, Options};
use flowdeck::config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "FLOWDECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "FLOWDECK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        /// Action: add, list, remove
        action: String,

        /// Project name (add) or id (remove)
        name: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Manage the function registry
    Function {
        /// Action: add, list, show, remove
        action: String,

        /// Function name (add) or id (show, remove)
        name: Option<String>,

        /// Input port as name:type (repeatable)
        #[arg(long = "input")]
        inputs: Vec<String>,

        /// Output port as name:type (repeatable)
        #[arg(long = "output")]
        outputs: Vec<String>,

        /// Implementation language
        #[arg(long)]
        language: Option<String>,

        /// Implementation source text
        #[arg(long)]
        implementation: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Manage flows
    Flow {
        /// Action: create, list, show, remove
        action: String,

        /// Flow name (create) or id (show, remove)
        name: Option<String>,

        /// Owning project id
        #[arg(long)]
        project: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Place, move and remove nodes
    Node {
        /// Action: add, remove, move
        action: String,

        /// Function id (add) or node id (remove, move)
        target: Option<String>,

        /// Flow id
        #[arg(long)]
        flow: Option<String>,

        /// Explicit node id
        #[arg(long)]
        id: Option<String>,

        /// Canvas X coordinate
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,

        /// Canvas Y coordinate
        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
    },

    /// Connect and disconnect ports
    Edge {
        /// Action: add, remove, list
        action: String,

        /// Edge id (remove)
        target: Option<String>,

        /// Flow id
        #[arg(long)]
        flow: Option<String>,

        /// Source endpoint as node.port
        #[arg(long)]
        from: Option<String>,

        /// Target endpoint as node.port
        #[arg(long)]
        to: Option<String>,

        /// Field mapping as out:in or out:in:cast (repeatable)
        #[arg(long = "map")]
        maps: Vec<String>,
    },

    /// Validate a flow
    Validate {
        /// Flow id
        #[arg(long)]
        flow: Option<String>,
    },

    /// Dry-run a flow and record the execution
    Run {
        /// Flow id
        #[arg(long)]
        flow: Option<String>,
    },

    /// Show the logs of an execution
    Logs {
        /// Execution id
        execution: Option<String>,

        /// Only entries for this node
        #[arg(long)]
        node: Option<String>,

        /// Minimum level (debug, info, warning, error)
        #[arg(long)]
        level: Option<String>,
    },

    /// Export a flow to various formats
    Export {
        /// Flow id
        #[arg(long)]
        flow: Option<String>,

        /// Output format (dot, json)
        #[arg(short, long, default_value = "dot")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key
        key: String,

        /// Value to set (omit to get)
        value: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load(cli.config.as_deref())?;

    // Initialize logging; RUST_LOG wins when set
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => settings.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let opts = Options {
        data_dir: cli.data_dir.unwrap_or(settings.data_dir),
        config_path: cli.config.unwrap_or_else(config::default_path),
        api_url: settings.api_url,
        json: cli.json,
        color: settings.color && !cli.no_color,
    };

    match cli.command {
        Commands::Project { action, name, description } => {
            commands::project::run(&opts, &action, name, description)
        }
        Commands::Function {
            action,
            name,
            inputs,
            outputs,
            language,
            implementation,
            description,
        } => commands::function::run(
            &opts,
            &action,
            name,
            FunctionArgs {
                inputs,
                outputs,
                language,
                implementation,
                description,
            },
        ),
        Commands::Flow { action, name, project, description } => {
            commands::flow::run(&opts, &action, name, project, description)
        }
        Commands::Node { action, target, flow, id, x, y } => {
            commands::node::run(&opts, &action, NodeArgs { flow, target, id, x, y })
        }
        Commands::Edge { action, target, flow, from, to, maps } => {
            commands::edge::run(&opts, &action, EdgeArgs { flow, from, to, maps, target })
        }
        Commands::Validate { flow } => commands::validate::run(&opts, flow),
        Commands::Run { flow } => commands::run::run(&opts, flow),
        Commands::Logs { execution, node, level } => {
            commands::logs::run(&opts, execution, node, level)
        }
        Commands::Export { flow, format, output } => {
            commands::export::run(&opts, flow, &format, output)
        }
        Commands::Config { key, value } => commands::config::run(&opts, &key, value),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}

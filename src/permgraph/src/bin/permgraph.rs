//! Permission graph CLI
//!
//! Loads a graph definition and answers ordering, validation, grant and
//! revoke questions against a held permission set given on the command line.
//!
//! ```text
//! permgraph --config permissions.toml order
//! permgraph --config permissions.toml validate --held edit,view
//! permgraph --config permissions.toml grant alter_tags --held view,edit
//! permgraph --config permissions.toml deny view --held view,edit --json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cretoai_permgraph::{DependencyGraph, GraphConfig};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CretoAI permission dependency graph CLI
#[derive(Parser)]
#[command(name = "permgraph")]
#[command(about = "Resolve permission grants and revokes against a prerequisite graph")]
#[command(version)]
struct Cli {
    /// Path to the graph definition (.toml or .json)
    #[arg(short, long, default_value = "permissions.toml", env = "PERMGRAPH_CONFIG")]
    config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every permission in dependency order
    Order,

    /// Check a held set and print it in canonical order
    Validate {
        /// Currently held permissions
        #[arg(long, value_delimiter = ',')]
        held: Vec<String>,
    },

    /// Check whether a permission can be granted
    Grant {
        /// Permission to grant
        permission: String,

        /// Currently held permissions
        #[arg(long, value_delimiter = ',')]
        held: Vec<String>,
    },

    /// Check whether a permission can be revoked
    Deny {
        /// Permission to revoke
        permission: String,

        /// Currently held permissions
        #[arg(long, value_delimiter = ',')]
        held: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},cretoai_permgraph={}", log_level, log_level).into()),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    // An error here makes the process exit with a non-zero status
    run(cli, &mut std::io::stdout().lock())
}

/// Execute one command, writing results to `out`
fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let graph = load_graph(&cli.config)?;
    info!(
        config = %cli.config.display(),
        permissions = graph.len(),
        "Loaded permission graph"
    );

    match cli.command {
        Command::Order => {
            let order = graph.topological_order();
            if cli.json {
                write_json(out, &order)?;
            } else {
                for permission in order {
                    writeln!(out, "{}", permission)?;
                }
            }
        }
        Command::Validate { held } => {
            let sorted = graph
                .validate(&held)
                .context("Held permission set is invalid")?;
            if cli.json {
                write_json(out, &sorted)?;
            } else {
                writeln!(out, "valid: {}", sorted.join(", "))?;
            }
        }
        Command::Grant { permission, held } => {
            let check = graph
                .check_grant(&held, &permission)
                .with_context(|| format!("Cannot decide grant of '{}'", permission))?;
            if cli.json {
                write_json(out, &check)?;
            } else if check.allowed {
                writeln!(out, "grant {}: allowed", check.permission)?;
            } else {
                writeln!(
                    out,
                    "grant {}: denied (missing {})",
                    check.permission,
                    check.missing.join(", ")
                )?;
            }
        }
        Command::Deny { permission, held } => {
            let check = graph
                .check_deny(&held, &permission)
                .with_context(|| format!("Cannot decide revoke of '{}'", permission))?;
            if cli.json {
                write_json(out, &check)?;
            } else if check.allowed {
                writeln!(out, "deny {}: allowed", check.permission)?;
            } else {
                writeln!(
                    out,
                    "deny {}: blocked (required by {})",
                    check.permission,
                    check.blocked_by.join(", ")
                )?;
            }
        }
    }

    Ok(())
}

fn load_graph(path: &Path) -> Result<DependencyGraph> {
    debug!(path = %path.display(), "Reading graph definition");

    let config = GraphConfig::from_file(path)
        .with_context(|| format!("Failed to load graph definition from {}", path.display()))?;

    config
        .build()
        .with_context(|| format!("Invalid permission graph in {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

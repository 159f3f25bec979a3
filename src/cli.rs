//! CLI for Hubble.
//!
//! Argument parsing for the `hubble` binary: subcommands, global flags, and
//! output format selection.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Hubble - Declarative Azure Event Hubs provisioning
#[derive(Parser, Debug, Clone)]
#[command(name = "hubble")]
#[command(author = "Hubble Contributors")]
#[command(version)]
#[command(about = "Declarative Azure Event Hubs provisioning", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run in check mode (dry-run, don't make changes)
    #[arg(long = "check", global = true)]
    pub check_mode: bool,

    /// Run in diff mode (show differences)
    #[arg(long = "diff", global = true)]
    pub diff_mode: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "HUBBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON output for scripting
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Human
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Reconcile a plan against Azure
    Apply(PlanArgs),

    /// Reconcile a plan in check mode (dry-run)
    Check(PlanArgs),

    /// Validate plan syntax and parameters
    Validate(PlanArgs),
}

/// Arguments shared by plan-driven subcommands
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Path to the plan file
    pub plan: PathBuf,
}

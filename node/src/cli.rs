//! # CLI Interface
//!
//! Defines the command-line argument structure for `strongbox` using
//! `clap` derive. Supports three subcommands: `run`, `demo` and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Strongbox scenario runner.
///
/// Executes a batch of escrow-vault and share-token calls against a fresh
/// in-memory ledger and prints a JSON report of outcomes, final balances,
/// emitted events and the resulting state root.
#[derive(Parser, Debug)]
#[command(
    name = "strongbox",
    about = "Strongbox escrow vault and share token runner",
    version,
    propagate_version = true
)]
pub struct StrongboxCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `strongbox` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a JSON scenario script.
    Run(RunArgs),
    /// Run the built-in end-to-end scenario.
    Demo(OutputArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's')]
    pub script: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options shared by every command that executes a scenario.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Path to a ledger config file (JSON). Missing fields use defaults.
    #[arg(long, short = 'c', env = "STRONGBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "STRONGBOX_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Dump Prometheus metrics to stderr after the run.
    #[arg(long)]
    pub metrics: bool,
}

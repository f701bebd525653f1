// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongbox
//!
//! Entry point for the `strongbox` binary. Parses CLI arguments, initializes
//! logging and metrics, and drives the escrow vault and share token through a
//! scenario against an in-memory ledger.
//!
//! The binary supports three subcommands:
//!
//! - `run`     execute a JSON scenario file
//! - `demo`    execute the built-in walk-through
//! - `version` print build version information
//!
//! The run report is written to stdout as JSON; logs and the optional
//! metrics dump go to stderr.

mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use strongbox_protocol::config::LedgerConfig;

use cli::{Commands, OutputArgs, StrongboxCli};
use logging::LogFormat;
use metrics::RunMetrics;
use scenario::{Runner, Scenario};

fn main() -> Result<()> {
    let cli = StrongboxCli::parse();

    match cli.command {
        Commands::Run(args) => {
            init(&args.output);
            let json = std::fs::read_to_string(&args.script)
                .with_context(|| format!("failed to read scenario {}", args.script.display()))?;
            let scenario = scenario::parse_scenario(&json)
                .with_context(|| format!("failed to load scenario {}", args.script.display()))?;
            execute(&scenario, &args.output)
        }
        Commands::Demo(output) => {
            init(&output);
            execute(&Scenario::demo(), &output)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn init(output: &OutputArgs) {
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&output.log_format),
    );
}

/// Runs `scenario` on a fresh ledger and prints the report.
fn execute(scenario: &Scenario, output: &OutputArgs) -> Result<()> {
    let config = match &output.config {
        Some(path) => load_config(path)?,
        None => LedgerConfig::default(),
    };
    tracing::info!(
        max_coin_name_length = config.max_coin_name_length,
        max_coin_symbol_length = config.max_coin_symbol_length,
        max_coin_decimals = config.max_coin_decimals,
        max_event_data_bytes = config.max_event_data_bytes,
        "ledger configured"
    );

    let metrics = RunMetrics::new();
    let mut runner = Runner::new(config, metrics.clone());
    let report = runner.run(scenario)?;

    let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{json}");

    if output.metrics {
        let text = metrics.encode().context("failed to encode metrics")?;
        eprintln!("{text}");
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<LedgerConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    LedgerConfig::from_json_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn print_version() {
    println!("strongbox {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", strongbox_protocol::config::PROTOCOL_VERSION);
    println!("rustc     {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}

//! # Statuses — print the status registry.
//!
//! ```bash
//! catver statuses
//! catver --config engine.yaml statuses --json
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::load_config;

/// Arguments for the `statuses` subcommand.
#[derive(Args, Debug)]
pub struct StatusesArgs {
    /// Print the registry as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Execute the statuses subcommand.
pub fn run_statuses(args: &StatusesArgs, config: Option<&Path>) -> Result<u8> {
    let config = load_config(config)?;
    let registry = config.registry().context("invalid status registry")?;

    if args.json {
        let table: serde_json::Map<String, serde_json::Value> = registry
            .entries()
            .map(|(status, id)| (status.name().to_string(), serde_json::json!(id.to_string())))
            .collect();
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(0);
    }

    println!("Status registry:");
    for (status, id) in registry.entries() {
        println!("  {:<13} {id}", status.name());
    }
    println!(
        "  resolve.ignore_tombstoned: {}",
        config.resolve.ignore_tombstoned
    );
    Ok(0)
}

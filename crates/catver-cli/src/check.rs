//! # Check — report invariant violations in a snapshot.
//!
//! Reads a snapshot written by `catver replay --snapshot` and runs the
//! per-root invariant checker over every root. Exits 2 when any root is
//! unsound.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use catver_state::check_invariants;

use crate::Snapshot;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Snapshot document (JSON).
    pub snapshot: PathBuf,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let snapshot = Snapshot::load(&args.snapshot)?;
    let registry = snapshot
        .config
        .registry()
        .context("snapshot carries an invalid status registry")?;

    let mut unsound = 0usize;
    for history in &snapshot.roots {
        let violations = check_invariants(history, &registry);
        if violations.is_empty() {
            tracing::debug!(root = %history.root_id(), "root is sound");
            continue;
        }
        unsound += 1;
        println!("{}:", history.root_id());
        for violation in &violations {
            println!("  {violation}");
        }
    }

    println!(
        "Checked {} roots, {} with violations",
        snapshot.roots.len(),
        unsound
    );
    Ok(if unsound == 0 { 0 } else { 2 })
}

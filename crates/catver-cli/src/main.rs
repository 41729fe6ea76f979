//! # catver CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use catver_cli::check::{run_check, CheckArgs};
use catver_cli::replay::{run_replay, ReplayArgs};
use catver_cli::statuses::{run_statuses, StatusesArgs};

/// Catalog versioning engine CLI
///
/// Replays lifecycle scenarios against an in-memory store, checks snapshot
/// invariants, and inspects the status registry.
#[derive(Parser, Debug)]
#[command(name = "catver", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a YAML scenario through the engine and print the resulting histories.
    Replay(ReplayArgs),

    /// Report invariant violations in a snapshot written by `replay --snapshot`.
    Check(CheckArgs),

    /// Print the status registry.
    Statuses(StatusesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "catver CLI starting");

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Replay(args) => run_replay(args, config),
        Commands::Check(args) => run_check(args),
        Commands::Statuses(args) => run_statuses(args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_replay() {
        let cli = Cli::try_parse_from(["catver", "replay", "scenario.yaml", "--json"]).unwrap();
        if let Commands::Replay(args) = cli.command {
            assert_eq!(args.scenario, PathBuf::from("scenario.yaml"));
            assert!(args.json);
            assert!(args.snapshot.is_none());
        } else {
            panic!("expected replay");
        }
    }

    #[test]
    fn cli_parse_replay_with_snapshot() {
        let cli = Cli::try_parse_from([
            "catver",
            "replay",
            "scenario.yaml",
            "--snapshot",
            "out.json",
        ])
        .unwrap();
        if let Commands::Replay(args) = cli.command {
            assert_eq!(args.snapshot, Some(PathBuf::from("out.json")));
        }
    }

    #[test]
    fn cli_parse_check() {
        let cli = Cli::try_parse_from(["catver", "check", "out.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["catver", "statuses"]).unwrap();
        assert_eq!(cli0.verbose, 0);

        let cli2 = Cli::try_parse_from(["catver", "-vv", "statuses"]).unwrap();
        assert_eq!(cli2.verbose, 2);
    }

    #[test]
    fn cli_parse_config_option() {
        let cli = Cli::try_parse_from(["catver", "statuses", "--config", "engine.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("engine.yaml")));
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["catver"]).is_err());
    }
}

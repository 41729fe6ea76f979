//! # catver-cli — CLI Tool for the Catalog Versioning Engine
//!
//! Provides the `catver` command-line interface for exercising the
//! versioning engine outside a service.
//!
//! ## Subcommands
//!
//! - `catver replay`: Run a YAML scenario through the engine.
//! - `catver check`: Report invariant violations in a snapshot.
//! - `catver statuses`: Print the status registry.
//!
//! ```bash
//! catver replay scenarios/publish-edit.yaml --snapshot out.json
//! catver check out.json
//! catver --config engine.yaml statuses
//! ```

pub mod check;
pub mod replay;
pub mod statuses;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use catver_core::EngineConfig;
use catver_state::RootHistory;

/// Load the engine configuration, or generate one when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load engine config: {}", path.display())),
        None => {
            tracing::debug!("no config given; generating status identifiers");
            Ok(EngineConfig::default())
        }
    }
}

/// Committed store contents together with the configuration needed to
/// interpret their status identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub config: EngineConfig,
    pub roots: Vec<RootHistory>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot: {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot: {}", path.display()))
    }
}

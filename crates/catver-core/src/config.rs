//! # Engine Configuration
//!
//! Loaded once at startup from YAML (or JSON, which YAML accepts):
//!
//! ```yaml
//! statuses:
//!   Draft: 3b1a0f6e-5c3e-4d8e-9a51-0d8a1c7f0001
//!   Modified: 3b1a0f6e-5c3e-4d8e-9a51-0d8a1c7f0002
//!   Published: 3b1a0f6e-5c3e-4d8e-9a51-0d8a1c7f0003
//!   OldPublished: 3b1a0f6e-5c3e-4d8e-9a51-0d8a1c7f0004
//!   Deleted: 3b1a0f6e-5c3e-4d8e-9a51-0d8a1c7f0005
//!   Removed: 3b1a0f6e-5c3e-4d8e-9a51-0d8a1c7f0006
//! resolve:
//!   ignore_tombstoned: true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CatverError;
use crate::status::{PublishingStatus, StatusId, StatusRegistry};

/// Defaults for version resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Exclude Deleted and OldPublished versions when no status is requested.
    #[serde(default = "default_true")]
    pub ignore_tombstoned: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            ignore_tombstoned: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Status name to persisted identifier.
    pub statuses: BTreeMap<String, Uuid>,
    /// Resolution defaults.
    #[serde(default)]
    pub resolve: ResolveConfig,
}

impl EngineConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, CatverError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration document.
    pub fn from_yaml(content: &str) -> Result<Self, CatverError> {
        serde_yaml::from_str(content).map_err(|e| CatverError::Config(e.to_string()))
    }

    /// Build the status registry described by this configuration.
    ///
    /// Fails on unknown status names, missing statuses, or shared identifiers.
    pub fn registry(&self) -> Result<StatusRegistry, CatverError> {
        let mapping = self
            .statuses
            .iter()
            .map(|(name, id)| Ok((PublishingStatus::from_name(name)?, StatusId::from_uuid(*id))))
            .collect::<Result<Vec<_>, CatverError>>()?;
        Ok(StatusRegistry::new(mapping)?)
    }

    /// Capture an existing registry as configuration.
    pub fn from_registry(registry: &StatusRegistry) -> Self {
        Self {
            statuses: registry
                .entries()
                .map(|(status, id)| (status.name().to_string(), *id.as_uuid()))
                .collect(),
            resolve: ResolveConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    /// Configuration with freshly generated status identifiers.
    fn default() -> Self {
        Self::from_registry(&StatusRegistry::generate())
    }
}

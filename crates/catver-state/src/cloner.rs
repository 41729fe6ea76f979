//! # Entity Cloner
//!
//! Copy-on-write needs a deep copy of a version's owned object graph. The
//! copy is *detached*: it carries content, validity window, and language
//! rows, but no identifier, root, lineage, or publishing status. The engine
//! assigns those when it attaches the copy to a root.

use catver_core::ValidityWindow;

use crate::model::{LanguageAvailability, Version};

/// A deep copy of a version's owned data, not yet attached to any root.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedVersion {
    /// Copied content.
    pub content: serde_json::Value,
    /// Copied validity window.
    pub validity: ValidityWindow,
    /// Copied language rows.
    pub language_availabilities: Vec<LanguageAvailability>,
}

/// Produces detached deep copies of versions.
///
/// Implementations for richer content models (relations held in other
/// tables, attachments) plug in here.
pub trait EntityCloner: Send + Sync {
    /// Copy everything `source` owns except identity, lineage, and status.
    fn clone_version(&self, source: &Version) -> DetachedVersion;
}

/// Clones the JSON content and every language row as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepCloner;

impl EntityCloner for DeepCloner {
    fn clone_version(&self, source: &Version) -> DetachedVersion {
        DetachedVersion {
            content: source.content.clone(),
            validity: source.validity,
            language_availabilities: source.language_availabilities.clone(),
        }
    }
}

//! # Version Records
//!
//! The persisted shapes the engine manipulates: physical versions, lineage
//! (numbering) records, and per-language availability rows. A version's
//! content is opaque to the engine and carried as JSON.

use serde::{Deserialize, Serialize};

use catver_core::{
    LanguageId, LineageId, PublishingStatus, RootId, StatusId, Timestamp, ValidityWindow,
    VersionId,
};

// ─── Language Availability ───────────────────────────────────────────

/// Publication sub-state of one version in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageAvailability {
    /// The language this row describes.
    pub language_id: LanguageId,
    /// Registry identifier of the language's publishing status.
    pub status: StatusId,
    /// Scheduled publish time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<Timestamp>,
    /// Scheduled archive time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_at: Option<Timestamp>,
    /// When the last scheduled publish of this language failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed_publish_at: Option<Timestamp>,
}

impl LanguageAvailability {
    /// A row with no scheduling.
    pub fn new(language_id: LanguageId, status: StatusId) -> Self {
        Self {
            language_id,
            status,
            publish_at: None,
            archive_at: None,
            last_failed_publish_at: None,
        }
    }
}

// ─── Version ─────────────────────────────────────────────────────────

/// One physical snapshot of a root's content and publishing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Physical identifier.
    pub id: VersionId,
    /// Owning root; unset until the version is first committed.
    pub root_id: Option<RootId>,
    /// Current lineage record; unset until seeded by the engine.
    pub lineage_id: Option<LineageId>,
    /// Registry identifier of the publishing status.
    pub publishing_status: StatusId,
    /// When a published version is considered live.
    #[serde(default)]
    pub validity: ValidityWindow,
    /// Names, descriptions, relations. Opaque here.
    #[serde(default)]
    pub content: serde_json::Value,
    /// One row per language present in the content.
    #[serde(default)]
    pub language_availabilities: Vec<LanguageAvailability>,
}

impl Version {
    /// A detached in-memory version with a fresh identifier and no root.
    pub fn new(publishing_status: StatusId, content: serde_json::Value) -> Self {
        Self {
            id: VersionId::new(),
            root_id: None,
            lineage_id: None,
            publishing_status,
            validity: ValidityWindow::UNBOUNDED,
            content,
            language_availabilities: Vec::new(),
        }
    }

    /// Add availability rows for `languages`, all at `status`.
    pub fn with_languages<'a>(
        mut self,
        languages: impl IntoIterator<Item = &'a LanguageId>,
        status: StatusId,
    ) -> Self {
        self.language_availabilities.extend(
            languages
                .into_iter()
                .map(|l| LanguageAvailability::new(l.clone(), status)),
        );
        self
    }

    /// Set the validity window.
    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    /// The availability row for `language`, if present.
    pub fn language(&self, language: &LanguageId) -> Option<&LanguageAvailability> {
        self.language_availabilities
            .iter()
            .find(|la| &la.language_id == language)
    }

    /// Mutable availability row for `language`, if present.
    pub fn language_mut(&mut self, language: &LanguageId) -> Option<&mut LanguageAvailability> {
        self.language_availabilities
            .iter_mut()
            .find(|la| &la.language_id == language)
    }
}

// ─── Lineage ─────────────────────────────────────────────────────────

/// Version numbering record of one root.
///
/// Records link backwards through `previous_lineage_id`; along any chain
/// `(major, minor)` strictly increases from oldest to newest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLineage {
    /// Identifier.
    pub id: LineageId,
    /// Root this record numbers.
    pub root_id: RootId,
    /// Incremented only by transitions that end in Published.
    pub version_major: u32,
    /// Incremented by every other content-changing transition.
    pub version_minor: u32,
    /// Predecessor in the chain.
    pub previous_lineage_id: Option<LineageId>,
    /// Last time this record changed.
    pub modified_at: Timestamp,
    /// Excluded from history listings.
    #[serde(default)]
    pub ignored: bool,
}

impl VersionLineage {
    /// A fresh record with a new identifier.
    pub fn new(
        root_id: RootId,
        version_major: u32,
        version_minor: u32,
        previous_lineage_id: Option<LineageId>,
    ) -> Self {
        Self {
            id: LineageId::new(),
            root_id,
            version_major,
            version_minor,
            previous_lineage_id,
            modified_at: Timestamp::now(),
            ignored: false,
        }
    }

    /// `(major, minor)`, comparable lexicographically.
    pub fn number(&self) -> (u32, u32) {
        (self.version_major, self.version_minor)
    }
}

// ─── Summaries and Changes ───────────────────────────────────────────

/// One listed version with its status and number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    /// Physical identifier.
    pub version_id: VersionId,
    /// Current lineage record.
    pub lineage_id: LineageId,
    /// Decoded publishing status.
    pub status: PublishingStatus,
    /// Major number.
    pub major: u32,
    /// Minor number.
    pub minor: u32,
    /// Lineage timestamp.
    pub modified_at: Timestamp,
}

impl VersionSummary {
    /// `(major, minor)`.
    pub fn number(&self) -> (u32, u32) {
        (self.major, self.minor)
    }
}

/// A status change of one version, reported so callers can propagate
/// side effects such as re-indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The version whose status changed.
    pub version_id: VersionId,
    /// Status before.
    pub from: PublishingStatus,
    /// Status after.
    pub to: PublishingStatus,
}

/// A status change of one language row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStatusChange {
    /// The language whose row changed.
    pub language_id: LanguageId,
    /// Status before.
    pub from: PublishingStatus,
    /// Status after.
    pub to: PublishingStatus,
}

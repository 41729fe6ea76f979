//! # Version History
//!
//! [`RootHistory`] is the arena holding every physical version and lineage
//! record of one root. [`OrderedVersions`] is the read-only view the engine
//! decides on: the root's non-ignored versions sorted by `(major, minor)`,
//! with pure selectors for "the latest version matching a status predicate".
//!
//! The ordered view is re-derived on every call; nothing is cached across
//! operations.

use serde::{Deserialize, Serialize};

use catver_core::{
    LineageId, PublishingStatus, RegistryError, RootId, StatusRegistry, VersionId,
};

use crate::model::{Version, VersionLineage, VersionSummary};

// ─── Arena ───────────────────────────────────────────────────────────

/// Every version and lineage record of one root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootHistory {
    root_id: RootId,
    versions: Vec<Version>,
    lineages: Vec<VersionLineage>,
}

impl RootHistory {
    /// An empty history for `root_id`.
    pub fn new(root_id: RootId) -> Self {
        Self {
            root_id,
            versions: Vec::new(),
            lineages: Vec::new(),
        }
    }

    /// The root this history belongs to.
    pub fn root_id(&self) -> RootId {
        self.root_id
    }

    /// All physical versions, in insertion order.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// All lineage records, in insertion order. Superseded records stay.
    pub fn lineages(&self) -> &[VersionLineage] {
        &self.lineages
    }

    /// Whether no version has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn version(&self, id: VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn version_mut(&mut self, id: VersionId) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.id == id)
    }

    pub fn lineage(&self, id: LineageId) -> Option<&VersionLineage> {
        self.lineages.iter().find(|l| l.id == id)
    }

    pub fn lineage_mut(&mut self, id: LineageId) -> Option<&mut VersionLineage> {
        self.lineages.iter_mut().find(|l| l.id == id)
    }

    /// The lineage record a version currently points at.
    pub fn lineage_of(&self, version: VersionId) -> Option<&VersionLineage> {
        self.version(version)
            .and_then(|v| v.lineage_id)
            .and_then(|id| self.lineage(id))
    }

    /// Highest `(major, minor)` across every lineage record, listed or not.
    ///
    /// New numbers are derived from this so they exceed anything a chain
    /// could link back to.
    pub fn max_number(&self) -> Option<(u32, u32)> {
        self.lineages.iter().map(VersionLineage::number).max()
    }

    /// Highest minor number issued under `major`, listed or not.
    pub fn max_minor_at(&self, major: u32) -> Option<u32> {
        self.lineages
            .iter()
            .filter(|l| l.version_major == major)
            .map(|l| l.version_minor)
            .max()
    }

    pub(crate) fn push_version(&mut self, version: Version) {
        self.versions.push(version);
    }

    pub(crate) fn push_lineage(&mut self, lineage: VersionLineage) {
        self.lineages.push(lineage);
    }

    /// Walk `previous_lineage_id` from `head` back to the origin.
    ///
    /// Returns records oldest-first. Stops at a dangling link or at a
    /// record already visited.
    pub fn chain_from(&self, head: LineageId) -> Vec<&VersionLineage> {
        let mut chain = Vec::new();
        let mut cursor = self.lineage(head);
        while let Some(record) = cursor {
            if chain.iter().any(|seen: &&VersionLineage| seen.id == record.id) {
                break;
            }
            chain.push(record);
            cursor = record.previous_lineage_id.and_then(|id| self.lineage(id));
        }
        chain.reverse();
        chain
    }
}

// ─── Ordered View ────────────────────────────────────────────────────

/// A root's listed versions, ascending by `(major, minor)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedVersions(Vec<VersionSummary>);

/// List a root's versions ordered by `(major, minor)` ascending.
///
/// Versions without a lineage record and versions whose lineage is marked
/// `ignored` are excluded. Ties are broken by lineage timestamp.
pub fn list_versions(
    history: &RootHistory,
    registry: &StatusRegistry,
) -> Result<OrderedVersions, RegistryError> {
    let mut summaries = Vec::with_capacity(history.versions.len());
    for version in &history.versions {
        let Some(lineage) = history.lineage_of(version.id) else {
            continue;
        };
        if lineage.ignored {
            continue;
        }
        summaries.push(VersionSummary {
            version_id: version.id,
            lineage_id: lineage.id,
            status: registry.status_of(version.publishing_status)?,
            major: lineage.version_major,
            minor: lineage.version_minor,
            modified_at: lineage.modified_at,
        });
    }
    summaries.sort_by(|a, b| {
        a.number()
            .cmp(&b.number())
            .then(a.modified_at.cmp(&b.modified_at))
    });
    Ok(OrderedVersions(summaries))
}

impl OrderedVersions {
    pub fn as_slice(&self) -> &[VersionSummary] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entry with the highest number.
    pub fn head(&self) -> Option<&VersionSummary> {
        self.0.last()
    }

    /// The entry for `version`, if listed.
    pub fn get(&self, version: VersionId) -> Option<&VersionSummary> {
        self.0.iter().find(|s| s.version_id == version)
    }

    /// Latest entry whose status is one of `statuses`.
    pub fn latest_in(&self, statuses: &[PublishingStatus]) -> Option<&VersionSummary> {
        self.0.iter().rev().find(|s| statuses.contains(&s.status))
    }

    /// Every entry whose status is one of `statuses`, oldest first.
    pub fn all_in(&self, statuses: &[PublishingStatus]) -> Vec<&VersionSummary> {
        self.0
            .iter()
            .filter(|s| statuses.contains(&s.status))
            .collect()
    }

    pub fn latest_published(&self) -> Option<&VersionSummary> {
        self.latest_in(&[PublishingStatus::Published])
    }

    pub fn latest_published_or_draft(&self) -> Option<&VersionSummary> {
        self.latest_in(&[PublishingStatus::Published, PublishingStatus::Draft])
    }

    /// The edit in progress (Draft or Modified), if any.
    pub fn last_modified(&self) -> Option<&VersionSummary> {
        self.latest_in(&[PublishingStatus::Draft, PublishingStatus::Modified])
    }

    /// Latest among Published, Draft, Modified.
    pub fn latest_active(&self) -> Option<&VersionSummary> {
        self.latest_in(&[
            PublishingStatus::Published,
            PublishingStatus::Draft,
            PublishingStatus::Modified,
        ])
    }

    pub fn latest_old_published(&self) -> Option<&VersionSummary> {
        self.latest_in(&[PublishingStatus::OldPublished])
    }

    /// Latest among Published, Draft, Modified, Deleted.
    pub fn last_version(&self) -> Option<&VersionSummary> {
        self.latest_in(&[
            PublishingStatus::Published,
            PublishingStatus::Draft,
            PublishingStatus::Modified,
            PublishingStatus::Deleted,
        ])
    }

    /// An in-progress entry other than `except`.
    pub fn other_in_progress(&self, except: VersionId) -> Option<&VersionSummary> {
        self.0
            .iter()
            .rev()
            .find(|s| s.version_id != except && s.status.is_in_progress())
    }
}

impl<'a> IntoIterator for &'a OrderedVersions {
    type Item = &'a VersionSummary;
    type IntoIter = std::slice::Iter<'a, VersionSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

//! # Publishing Status Vocabulary and Registry
//!
//! The closed set of six publishing statuses and the registry mapping them
//! to opaque persisted identifiers.
//!
//! ## States
//!
//! ```text
//! Draft ──▶ Published ──▶ OldPublished
//!             │   ▲
//!             ▼   │
//!           Modified
//!
//! any ──▶ Deleted ──▶ Removed (terminal tombstone)
//! ```
//!
//! Persisted records (versions, language availabilities) carry a
//! [`StatusId`], never the enum. The engine resolves every comparison and
//! assignment through [`StatusRegistry`], which is built once at startup
//! and shared read-only for the lifetime of the process.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegistryError;

/// One of the six publishing statuses of a version or a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PublishingStatus {
    /// First edit of a never-published entity.
    Draft,
    /// Edit in progress on top of a published version.
    Modified,
    /// The live version.
    Published,
    /// A formerly live version superseded by a newer publish.
    OldPublished,
    /// Archived by a user; restorable.
    Deleted,
    /// Terminal tombstone.
    Removed,
}

impl PublishingStatus {
    /// All statuses in declaration order.
    pub const ALL: [PublishingStatus; 6] = [
        Self::Draft,
        Self::Modified,
        Self::Published,
        Self::OldPublished,
        Self::Deleted,
        Self::Removed,
    ];

    /// Canonical name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Modified => "Modified",
            Self::Published => "Published",
            Self::OldPublished => "OldPublished",
            Self::Deleted => "Deleted",
            Self::Removed => "Removed",
        }
    }

    /// Look up a status by its canonical name.
    pub fn from_name(name: &str) -> Result<Self, RegistryError> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))
    }

    /// Draft or Modified: an edit that has not gone live.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Draft | Self::Modified)
    }

    /// Deleted or OldPublished: retired but still stored.
    pub fn is_retired(&self) -> bool {
        matches!(self, Self::Deleted | Self::OldPublished)
    }
}

impl std::fmt::Display for PublishingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PublishingStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Opaque persisted identifier of a publishing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(Uuid);

impl StatusId {
    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for StatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status:{}", self.0)
    }
}

/// Bidirectional mapping between [`PublishingStatus`] and [`StatusId`].
///
/// Always complete: every status has exactly one identifier and no
/// identifier is shared. Construction fails otherwise.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    ids: [StatusId; 6],
    statuses: HashMap<StatusId, PublishingStatus>,
}

impl StatusRegistry {
    /// Build a registry from an explicit mapping.
    pub fn new(
        mapping: impl IntoIterator<Item = (PublishingStatus, StatusId)>,
    ) -> Result<Self, RegistryError> {
        let mut slots: [Option<StatusId>; 6] = [None; 6];
        let mut statuses = HashMap::new();
        for (status, id) in mapping {
            if let Some(existing) = statuses.insert(id, status) {
                if existing != status {
                    return Err(RegistryError::DuplicateId {
                        id: id.to_string(),
                        first: existing.to_string(),
                        second: status.to_string(),
                    });
                }
            }
            slots[slot(status)] = Some(id);
        }

        let mut ids = [StatusId(Uuid::nil()); 6];
        for status in PublishingStatus::ALL {
            ids[slot(status)] =
                slots[slot(status)].ok_or_else(|| RegistryError::Missing(status.to_string()))?;
        }
        // A status remapped twice leaves its first identifier orphaned.
        statuses.retain(|id, status| ids[slot(*status)] == *id);
        Ok(Self { ids, statuses })
    }

    /// Build a registry with freshly generated identifiers.
    pub fn generate() -> Self {
        let ids = PublishingStatus::ALL.map(|_| StatusId(Uuid::new_v4()));
        let statuses = PublishingStatus::ALL
            .into_iter()
            .map(|s| (ids[slot(s)], s))
            .collect();
        Self { ids, statuses }
    }

    /// The identifier registered for `status`.
    pub fn id_for(&self, status: PublishingStatus) -> StatusId {
        self.ids[slot(status)]
    }

    /// The identifier registered under a status name.
    pub fn id_for_name(&self, name: &str) -> Result<StatusId, RegistryError> {
        PublishingStatus::from_name(name).map(|s| self.id_for(s))
    }

    /// The status registered under `id`.
    pub fn status_of(&self, id: StatusId) -> Result<PublishingStatus, RegistryError> {
        self.statuses
            .get(&id)
            .copied()
            .ok_or_else(|| RegistryError::UnknownId(id.to_string()))
    }

    /// Whether `id` is the identifier of `status`.
    pub fn is(&self, id: StatusId, status: PublishingStatus) -> bool {
        self.id_for(status) == id
    }

    /// Whether `id` is the identifier of any of `statuses`.
    pub fn is_any(&self, id: StatusId, statuses: &[PublishingStatus]) -> bool {
        statuses.iter().any(|s| self.is(id, *s))
    }

    /// Iterate `(status, id)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (PublishingStatus, StatusId)> + '_ {
        PublishingStatus::ALL
            .into_iter()
            .map(move |s| (s, self.id_for(s)))
    }
}

fn slot(status: PublishingStatus) -> usize {
    status as usize
}

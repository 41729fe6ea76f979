//! # History Invariants
//!
//! A single linear pass over a root's arena that reports every violation of
//! the per-root rules. Used by the property tests and by `catver check`.

use std::collections::HashSet;

use serde::Serialize;

use catver_core::{LineageId, PublishingStatus, RootId, StatusRegistry, VersionId};

use crate::history::RootHistory;

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InvariantViolation {
    /// More than one listed version is Draft or Modified.
    MultipleInProgress(Vec<VersionId>),
    /// More than one listed version is Published.
    MultiplePublished(Vec<VersionId>),
    /// A lineage record does not number higher than its predecessor.
    NonMonotonicChain {
        /// The later record.
        lineage: LineageId,
        /// Its predecessor.
        previous: LineageId,
    },
    /// A lineage record links to a record not in this root.
    DanglingLink {
        /// The record with the bad link.
        lineage: LineageId,
        /// The missing predecessor.
        missing: LineageId,
    },
    /// A version points at a lineage record that is missing or belongs to
    /// another root.
    ForeignLineage {
        /// The version.
        version: VersionId,
    },
    /// A version or lineage record names a different root.
    ForeignRoot {
        /// The root found on the record.
        found: RootId,
    },
    /// A version carries a status identifier the registry does not know.
    UnknownStatus {
        /// The version.
        version: VersionId,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleInProgress(ids) => write!(f, "{} versions in progress", ids.len()),
            Self::MultiplePublished(ids) => write!(f, "{} versions published", ids.len()),
            Self::NonMonotonicChain { lineage, previous } => {
                write!(f, "{lineage} does not number above its predecessor {previous}")
            }
            Self::DanglingLink { lineage, missing } => {
                write!(f, "{lineage} links to missing {missing}")
            }
            Self::ForeignLineage { version } => {
                write!(f, "{version} points at a missing or foreign lineage record")
            }
            Self::ForeignRoot { found } => write!(f, "record belongs to {found}"),
            Self::UnknownStatus { version } => write!(f, "{version} has an unregistered status"),
        }
    }
}

/// Check every per-root invariant. An empty result means the history is sound.
pub fn check_invariants(
    history: &RootHistory,
    registry: &StatusRegistry,
) -> Vec<InvariantViolation> {
    let root_id = history.root_id();
    let mut violations = Vec::new();
    let mut in_progress = Vec::new();
    let mut published = Vec::new();

    for version in history.versions() {
        if let Some(found) = version.root_id.filter(|r| *r != root_id) {
            violations.push(InvariantViolation::ForeignRoot { found });
        }
        let lineage = version.lineage_id.and_then(|id| history.lineage(id));
        let Some(lineage) = lineage else {
            if version.lineage_id.is_some() {
                violations.push(InvariantViolation::ForeignLineage {
                    version: version.id,
                });
            }
            continue;
        };
        if lineage.ignored {
            continue;
        }
        match registry.status_of(version.publishing_status) {
            Ok(status) if status.is_in_progress() => in_progress.push(version.id),
            Ok(PublishingStatus::Published) => published.push(version.id),
            Ok(_) => {}
            Err(_) => violations.push(InvariantViolation::UnknownStatus {
                version: version.id,
            }),
        }
    }
    if in_progress.len() > 1 {
        violations.push(InvariantViolation::MultipleInProgress(in_progress));
    }
    if published.len() > 1 {
        violations.push(InvariantViolation::MultiplePublished(published));
    }

    let mut foreign_roots = HashSet::new();
    for lineage in history.lineages() {
        if lineage.root_id != root_id && foreign_roots.insert(lineage.root_id) {
            violations.push(InvariantViolation::ForeignRoot {
                found: lineage.root_id,
            });
        }
        let Some(previous_id) = lineage.previous_lineage_id else {
            continue;
        };
        match history.lineage(previous_id) {
            None => violations.push(InvariantViolation::DanglingLink {
                lineage: lineage.id,
                missing: previous_id,
            }),
            Some(previous) if previous.number() >= lineage.number() => {
                violations.push(InvariantViolation::NonMonotonicChain {
                    lineage: lineage.id,
                    previous: previous_id,
                })
            }
            Some(_) => {}
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Version, VersionLineage};

    fn add(
        history: &mut RootHistory,
        registry: &StatusRegistry,
        status: PublishingStatus,
        lineage: VersionLineage,
    ) -> VersionId {
        let mut v = Version::new(registry.id_for(status), serde_json::Value::Null);
        v.root_id = Some(history.root_id());
        v.lineage_id = Some(lineage.id);
        let id = v.id;
        history.push_lineage(lineage);
        history.push_version(v);
        id
    }

    #[test]
    fn test_sound_history_has_no_violations() {
        let registry = StatusRegistry::generate();
        let mut h = RootHistory::new(RootId::new());
        let l1 = VersionLineage::new(h.root_id(), 1, 0, None);
        let l2 = VersionLineage::new(h.root_id(), 1, 1, Some(l1.id));
        add(&mut h, &registry, PublishingStatus::Published, l1);
        add(&mut h, &registry, PublishingStatus::Modified, l2);
        assert!(check_invariants(&h, &registry).is_empty());
    }

    #[test]
    fn test_two_in_progress_detected() {
        let registry = StatusRegistry::generate();
        let mut h = RootHistory::new(RootId::new());
        let root = h.root_id();
        add(&mut h, &registry, PublishingStatus::Draft, VersionLineage::new(root, 0, 1, None));
        add(&mut h, &registry, PublishingStatus::Modified, VersionLineage::new(root, 0, 2, None));
        let violations = check_invariants(&h, &registry);
        assert!(matches!(
            violations.as_slice(),
            [InvariantViolation::MultipleInProgress(ids)] if ids.len() == 2
        ));
    }

    #[test]
    fn test_ignored_versions_not_counted() {
        let registry = StatusRegistry::generate();
        let mut h = RootHistory::new(RootId::new());
        let root = h.root_id();
        add(&mut h, &registry, PublishingStatus::Published, VersionLineage::new(root, 1, 0, None));
        let mut abandoned = VersionLineage::new(root, 2, 0, None);
        abandoned.ignored = true;
        add(&mut h, &registry, PublishingStatus::Published, abandoned);
        assert!(check_invariants(&h, &registry).is_empty());
    }

    #[test]
    fn test_non_monotonic_and_dangling_links_detected() {
        let registry = StatusRegistry::generate();
        let mut h = RootHistory::new(RootId::new());
        let root = h.root_id();
        let l1 = VersionLineage::new(root, 2, 0, None);
        let l2 = VersionLineage::new(root, 1, 5, Some(l1.id));
        let missing = LineageId::new();
        let l3 = VersionLineage::new(root, 3, 0, Some(missing));
        add(&mut h, &registry, PublishingStatus::OldPublished, l1);
        add(&mut h, &registry, PublishingStatus::OldPublished, l2);
        add(&mut h, &registry, PublishingStatus::Published, l3);
        let violations = check_invariants(&h, &registry);
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::NonMonotonicChain { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::DanglingLink { missing: m, .. } if *m == missing)));
    }
}

//! # Version Lifecycle Engine
//!
//! Decides when a new physical version must be created, how version
//! numbers advance, how a previously published version is retired, and
//! which version a read should see.
//!
//! ## Transitions
//!
//! ```text
//!  (no versions) ──acquire──▶ Draft (0,1)
//!                                 │ publish
//!                                 ▼
//!  Published (n,0) ──acquire──▶ Modified clone (n,m+1)   [copy-on-write]
//!       │                         │ publish
//!       ▼                         ▼
//!  OldPublished ◀──demote──── Published (n+1,0)
//! ```
//!
//! ## Invariants
//!
//! Per root, at all times:
//! - at most one version is Draft or Modified (the edit in progress);
//! - at most one version is Published, and a publish demotes the previous
//!   one to OldPublished in the same operation;
//! - along any lineage chain `(major, minor)` strictly increases. New
//!   numbers are derived from the highest number ever issued for the root.
//!
//! Every check runs before the first write of an operation. An operation
//! that fails must cause the caller to drop its unit of work.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use catver_core::{
    CatverError, EngineConfig, LanguageId, LineageId, PublishingStatus, RegistryError,
    ResolveConfig, RootId, StatusRegistry, Timestamp, VersionId,
};

use crate::cloner::{DeepCloner, EntityCloner};
use crate::history::{list_versions, OrderedVersions, RootHistory};
use crate::model::{StatusChange, Version, VersionLineage};
use crate::store::{StoreError, UnitOfWork};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by the lifecycle engine.
///
/// None of these are retried internally. Conflicts are business-rule
/// violations; stale handles require the caller to re-fetch.
#[derive(Error, Debug)]
pub enum VersioningError {
    /// The requested transition is not allowed from the current status.
    #[error("illegal transition of {version_id}: {from} -> {to}")]
    IllegalTransition {
        /// The version acted upon.
        version_id: VersionId,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Another edit is already in progress for the root.
    #[error("root {root_id} already has an edit in progress ({existing} is {status})")]
    ConflictInProgress {
        /// The root.
        root_id: RootId,
        /// The in-progress version.
        existing: VersionId,
        /// Its status.
        status: PublishingStatus,
    },

    /// Publishing to Modified while another edit is in progress.
    #[error("cannot publish {version_id} as Modified: {existing} is already in progress for root {root_id}")]
    PublishModifiedExists {
        /// The root.
        root_id: RootId,
        /// The version the caller tried to publish.
        version_id: VersionId,
        /// The in-progress version.
        existing: VersionId,
    },

    /// The caller edits through a handle that is not the current edit.
    #[error("stale handle for root {root_id}: edit in progress is {expected}, caller holds {actual}")]
    StaleHandleConflict {
        /// The root.
        root_id: RootId,
        /// The version currently in progress.
        expected: VersionId,
        /// The version the caller passed.
        actual: VersionId,
    },

    /// A new entity was submitted for a root that already has versions.
    #[error("root {0} already has versions; edit an existing version instead")]
    RootAlreadyVersioned(RootId),

    /// The version does not exist (or is excluded from history).
    #[error("version {0} not found")]
    UnknownVersion(VersionId),

    /// The version has no availability row for the language.
    #[error("version {version_id} has no availability row for language {language_id}")]
    UnknownLanguage {
        /// The version.
        version_id: VersionId,
        /// The missing language.
        language_id: LanguageId,
    },

    /// Stored records are inconsistent (e.g. a dangling lineage link).
    #[error("corrupt history for root {root_id}: {reason}")]
    CorruptHistory {
        /// The root.
        root_id: RootId,
        /// What is inconsistent.
        reason: String,
    },

    /// A stored status identifier is not in the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The unit of work failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VersioningError {
    /// Whether the caller should re-fetch the current editable version
    /// and retry with fresh data.
    pub fn requires_refetch(&self) -> bool {
        matches!(
            self,
            Self::StaleHandleConflict { .. } | Self::Store(StoreError::StaleRoot { .. })
        )
    }

    /// Whether this is a business-rule conflict that must not be retried.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ConflictInProgress { .. } | Self::PublishModifiedExists { .. }
        )
    }

    /// Stable snake_case name of the variant, for reports and scenario
    /// expectations.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IllegalTransition { .. } => "illegal_transition",
            Self::ConflictInProgress { .. } => "conflict_in_progress",
            Self::PublishModifiedExists { .. } => "publish_modified_exists",
            Self::StaleHandleConflict { .. } => "stale_handle",
            Self::RootAlreadyVersioned(_) => "root_already_versioned",
            Self::UnknownVersion(_) => "unknown_version",
            Self::UnknownLanguage { .. } => "unknown_language",
            Self::CorruptHistory { .. } => "corrupt_history",
            Self::Registry(_) => "registry",
            Self::Store(StoreError::StaleRoot { .. }) => "stale_root",
            Self::Store(_) => "store",
        }
    }

    fn illegal(version_id: VersionId, from: PublishingStatus, to: PublishingStatus) -> Self {
        tracing::warn!(version = %version_id, %from, %to, "illegal transition rejected");
        Self::IllegalTransition {
            version_id,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// ─── Requests and Outcomes ───────────────────────────────────────────

/// What the caller wants to edit.
#[derive(Debug, Clone)]
pub enum EditTarget {
    /// A brand-new entity; the in-memory record becomes its first version.
    New(Version),
    /// An existing physical version, identified by the caller's handle.
    Existing(VersionId),
}

/// How copy-on-write treats the clone's status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    /// The clone becomes Modified; the source is untouched.
    #[default]
    Standard,
    /// The clone inherits the source's status. A Published source is
    /// superseded immediately: the clone is promoted to the next major
    /// version and the source demoted to OldPublished, through the same
    /// promotion path as [`VersioningManager::publish`].
    KeepPreviousState,
}

/// Result of acquiring an editable version.
#[derive(Debug, Clone)]
pub struct Acquired {
    /// The version the caller should continue operating on.
    pub version: Version,
    /// Status changes made as a side effect (demotions, promotions).
    pub changes: Vec<StatusChange>,
    /// Whether a copy-on-write clone was created.
    pub copied: bool,
}

// ─── Engine ──────────────────────────────────────────────────────────

/// The version lifecycle engine.
///
/// Holds only immutable collaborators; every operation reads history fresh
/// from the caller's unit of work.
#[derive(Clone)]
pub struct VersioningManager {
    pub(crate) registry: Arc<StatusRegistry>,
    cloner: Arc<dyn EntityCloner>,
    resolve: ResolveConfig,
}

impl std::fmt::Debug for VersioningManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersioningManager")
            .field("resolve", &self.resolve)
            .finish_non_exhaustive()
    }
}

impl VersioningManager {
    /// An engine using `registry`, the [`DeepCloner`], and default resolution.
    pub fn new(registry: Arc<StatusRegistry>) -> Self {
        Self {
            registry,
            cloner: Arc::new(DeepCloner),
            resolve: ResolveConfig::default(),
        }
    }

    /// Build from configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CatverError> {
        Ok(Self::new(Arc::new(config.registry()?)).with_resolve_config(config.resolve.clone()))
    }

    /// Replace the entity cloner.
    pub fn with_cloner(mut self, cloner: Arc<dyn EntityCloner>) -> Self {
        self.cloner = cloner;
        self
    }

    /// Replace the resolution defaults.
    pub fn with_resolve_config(mut self, resolve: ResolveConfig) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    // ── History reader ──────────────────────────────────────────────

    /// A root's versions ordered by `(major, minor)`; empty for unknown roots.
    pub fn list_versions<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        root: RootId,
    ) -> Result<OrderedVersions, VersioningError> {
        match uow.history(root)? {
            Some(history) => Ok(list_versions(history, &self.registry)?),
            None => Ok(OrderedVersions::default()),
        }
    }

    /// [`list_versions`](Self::list_versions) for many roots, grouped by root.
    pub fn list_versions_many<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        roots: &[RootId],
    ) -> Result<BTreeMap<RootId, OrderedVersions>, VersioningError> {
        let mut grouped = BTreeMap::new();
        for root in roots {
            if grouped.contains_key(root) {
                continue;
            }
            grouped.insert(*root, self.list_versions(uow, *root)?);
        }
        Ok(grouped)
    }

    /// The lineage chain ending at the root's newest listed version,
    /// oldest first.
    pub fn lineage_chain<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        root: RootId,
    ) -> Result<Vec<VersionLineage>, VersioningError> {
        let Some(history) = uow.history(root)? else {
            return Ok(Vec::new());
        };
        let list = list_versions(history, &self.registry)?;
        Ok(match list.head() {
            Some(head) => history
                .chain_from(head.lineage_id)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        })
    }

    // ── Roots ───────────────────────────────────────────────────────

    /// Attach a fresh root to a version that has none. Idempotent.
    pub fn ensure_root(&self, version: &mut Version) -> RootId {
        *version.root_id.get_or_insert_with(RootId::new)
    }

    // ── Acquire for edit ────────────────────────────────────────────

    /// Obtain the version the caller should write to.
    ///
    /// - New entity: seeds lineage `(0,1)` Draft, or `(1,0)` when the
    ///   status (`target_status`, else the record's own) is not Draft. A root
    ///   whose only versions were abandoned counts as new; its numbering
    ///   continues past the abandoned records.
    /// - Edit in progress and no explicit Published target: continues it,
    ///   bumping its minor number. The handle must be that version.
    /// - `target_status = Published`: publishes directly, cloning unless
    ///   the handle is already the edit in progress.
    /// - Otherwise: copy-on-write clone per `mode`.
    pub fn acquire_editable_version<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        target: EditTarget,
        mode: EditMode,
        target_status: Option<PublishingStatus>,
    ) -> Result<Acquired, VersioningError> {
        match target {
            EditTarget::New(version) => self.create_first_version(uow, version, target_status),
            EditTarget::Existing(id) => self.edit_existing(uow, id, mode, target_status),
        }
    }

    fn create_first_version<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        mut version: Version,
        target_status: Option<PublishingStatus>,
    ) -> Result<Acquired, VersioningError> {
        let status = match target_status {
            Some(status) => status,
            None => self.registry.status_of(version.publishing_status)?,
        };
        if !matches!(
            status,
            PublishingStatus::Draft | PublishingStatus::Modified | PublishingStatus::Published
        ) {
            return Err(VersioningError::illegal(
                version.id,
                PublishingStatus::Draft,
                status,
            ));
        }

        let root_id = self.ensure_root(&mut version);
        // Only abandoned edits may remain; their numbers stay taken.
        let listed = match uow.history(root_id)? {
            Some(history) => Some(list_versions(history, &self.registry)?.len()),
            None => None,
        };
        let history = match listed {
            Some(0) => uow
                .history(root_id)?
                .ok_or_else(|| corrupt(root_id, "root vanished within the unit of work"))?,
            Some(_) => return Err(VersioningError::RootAlreadyVersioned(root_id)),
            None => uow.create_root(root_id)?,
        };

        let issued = history.max_number().unwrap_or((0, 0));
        let (major, minor) = if status == PublishingStatus::Draft {
            (issued.0, issued.1 + 1)
        } else {
            (issued.0 + 1, 0)
        };
        let lineage = VersionLineage::new(root_id, major, minor, None);
        version.lineage_id = Some(lineage.id);
        version.publishing_status = self.registry.id_for(status);
        history.push_lineage(lineage);
        history.push_version(version.clone());

        tracing::info!(root = %root_id, version = %version.id, %status, major, minor, "created first version");
        Ok(Acquired {
            version,
            changes: Vec::new(),
            copied: false,
        })
    }

    fn edit_existing<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        mode: EditMode,
        target_status: Option<PublishingStatus>,
    ) -> Result<Acquired, VersioningError> {
        let history = load_for_version(uow, id)?;
        let root_id = history.root_id();
        let list = list_versions(history, &self.registry)?;
        let source = list
            .get(id)
            .cloned()
            .ok_or(VersioningError::UnknownVersion(id))?;

        if source.status == PublishingStatus::Removed {
            return Err(VersioningError::illegal(
                id,
                source.status,
                target_status.unwrap_or(PublishingStatus::Modified),
            ));
        }
        let publish_directly = match target_status {
            None | Some(PublishingStatus::Draft) | Some(PublishingStatus::Modified) => false,
            Some(PublishingStatus::Published) => true,
            Some(other) => return Err(VersioningError::illegal(id, source.status, other)),
        };

        // Continuation of the edit in progress.
        if !publish_directly {
            if let Some(in_progress) = list.last_modified() {
                if in_progress.version_id != id {
                    tracing::warn!(root = %root_id, expected = %in_progress.version_id, actual = %id, "edit through stale handle");
                    return Err(VersioningError::StaleHandleConflict {
                        root_id,
                        expected: in_progress.version_id,
                        actual: id,
                    });
                }
                let (major, minor) = in_progress.number();
                // A forced transition may have taken the next minor already.
                let issued = history.max_minor_at(major).unwrap_or(minor).max(minor);
                let lineage = history
                    .lineage_mut(in_progress.lineage_id)
                    .ok_or_else(|| corrupt(root_id, "in-progress lineage missing"))?;
                lineage.version_minor = issued + 1;
                lineage.modified_at = Timestamp::now();
                tracing::debug!(root = %root_id, version = %id, minor = lineage.version_minor, "continuing edit in progress");
                let version = history
                    .version(id)
                    .cloned()
                    .ok_or(VersioningError::UnknownVersion(id))?;
                return Ok(Acquired {
                    version,
                    changes: Vec::new(),
                    copied: false,
                });
            }
        }

        // Save-and-publish.
        if publish_directly {
            let (target, copied) = if source.status.is_in_progress() {
                (id, false)
            } else {
                (self.attach_clone(history, id)?, true)
            };
            let changes = self.promote(history, &list, target, source.status)?;
            let version = history
                .version(target)
                .cloned()
                .ok_or(VersioningError::UnknownVersion(target))?;
            return Ok(Acquired {
                version,
                changes,
                copied,
            });
        }

        // Copy-on-write.
        let clone = self.attach_clone(history, id)?;
        let mut changes = Vec::new();
        match (mode, source.status) {
            (EditMode::KeepPreviousState, PublishingStatus::Published) => {
                // The clone had no status before; only the demotion is a change.
                changes = self.promote(history, &list, clone, PublishingStatus::Published)?;
                changes.retain(|change| change.version_id != clone);
                tracing::info!(root = %root_id, source = %id, clone = %clone, "clone promoted in place of published source");
            }
            (EditMode::KeepPreviousState, inherited) => {
                self.assign_next_minor(history, clone, inherited, Some(source.lineage_id))?;
            }
            (EditMode::Standard, _) => {
                self.assign_next_minor(
                    history,
                    clone,
                    PublishingStatus::Modified,
                    Some(source.lineage_id),
                )?;
                tracing::debug!(root = %root_id, source = %id, clone = %clone, "copy-on-write clone created");
            }
        }
        let version = history
            .version(clone)
            .cloned()
            .ok_or(VersioningError::UnknownVersion(clone))?;
        Ok(Acquired {
            version,
            changes,
            copied: true,
        })
    }

    // ── Forced transition ───────────────────────────────────────────

    /// Push a version directly to `new_status`, bypassing copy-on-write.
    ///
    /// Returns `Ok(None)` without touching anything when `allowed_from` is
    /// given and the current status is not in it.
    pub fn force_status<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        new_status: PublishingStatus,
        allowed_from: Option<&[PublishingStatus]>,
    ) -> Result<Option<StatusChange>, VersioningError> {
        let history = load_for_version(uow, id)?;
        let root_id = history.root_id();
        let list = list_versions(history, &self.registry)?;
        let current = list
            .get(id)
            .cloned()
            .ok_or(VersioningError::UnknownVersion(id))?;

        if let Some(allowed) = allowed_from {
            if !allowed.contains(&current.status) {
                tracing::debug!(version = %id, from = %current.status, to = %new_status, "forced transition skipped: current status not allowed");
                return Ok(None);
            }
        }
        if current.status == PublishingStatus::Removed || new_status == PublishingStatus::Published
        {
            return Err(VersioningError::illegal(id, current.status, new_status));
        }
        if new_status.is_in_progress() {
            if let Some(other) = list.other_in_progress(id) {
                tracing::warn!(root = %root_id, existing = %other.version_id, "forced transition rejected: edit in progress");
                return Err(VersioningError::ConflictInProgress {
                    root_id,
                    existing: other.version_id,
                    status: other.status,
                });
            }
        }

        self.assign_next_minor(history, id, new_status, Some(current.lineage_id))?;
        tracing::info!(root = %root_id, version = %id, from = %current.status, to = %new_status, "status forced");
        Ok(Some(StatusChange {
            version_id: id,
            from: current.status,
            to: new_status,
        }))
    }

    // ── Publish ─────────────────────────────────────────────────────

    /// Move a version to Published (or back to Modified).
    ///
    /// Returns every status change made, demotions first. A version already
    /// at `target` and already the newest listed version yields no changes.
    pub fn publish<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        target: PublishingStatus,
    ) -> Result<Vec<StatusChange>, VersioningError> {
        let history = load_for_version(uow, id)?;
        let root_id = history.root_id();
        let list = list_versions(history, &self.registry)?;
        let current = list
            .get(id)
            .cloned()
            .ok_or(VersioningError::UnknownVersion(id))?;

        if !matches!(target, PublishingStatus::Published | PublishingStatus::Modified) {
            return Err(VersioningError::illegal(id, current.status, target));
        }
        let is_head = list.head().map(|h| h.version_id) == Some(id);
        if current.status == target && is_head {
            tracing::debug!(version = %id, %target, "publish is a no-op");
            return Ok(Vec::new());
        }
        if current.status == PublishingStatus::Removed {
            return Err(VersioningError::illegal(id, current.status, target));
        }

        match target {
            PublishingStatus::Published => self.promote(history, &list, id, current.status),
            PublishingStatus::Modified => {
                if let Some(other) = list.other_in_progress(id) {
                    tracing::warn!(root = %root_id, existing = %other.version_id, "publish as modified rejected");
                    return Err(VersioningError::PublishModifiedExists {
                        root_id,
                        version_id: id,
                        existing: other.version_id,
                    });
                }
                let previous = history
                    .lineage(current.lineage_id)
                    .ok_or_else(|| corrupt(root_id, "current lineage missing"))?
                    .previous_lineage_id;
                self.assign_next_minor(history, id, PublishingStatus::Modified, previous)?;
                tracing::info!(root = %root_id, version = %id, from = %current.status, "reverted to modified");
                Ok(vec![StatusChange {
                    version_id: id,
                    from: current.status,
                    to: PublishingStatus::Modified,
                }])
            }
            other => Err(VersioningError::illegal(id, current.status, other)),
        }
    }

    // ── Abandon ─────────────────────────────────────────────────────

    /// Discard an edit in progress: its lineage is marked ignored and the
    /// version tombstoned. The published version, if any, is untouched.
    pub fn abandon_version<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
    ) -> Result<StatusChange, VersioningError> {
        let history = load_for_version(uow, id)?;
        let root_id = history.root_id();
        let list = list_versions(history, &self.registry)?;
        let current = list
            .get(id)
            .cloned()
            .ok_or(VersioningError::UnknownVersion(id))?;
        if !current.status.is_in_progress() {
            return Err(VersioningError::illegal(
                id,
                current.status,
                PublishingStatus::Removed,
            ));
        }

        let lineage = history
            .lineage_mut(current.lineage_id)
            .ok_or_else(|| corrupt(root_id, "in-progress lineage missing"))?;
        lineage.ignored = true;
        lineage.modified_at = Timestamp::now();
        self.set_status(history, id, PublishingStatus::Removed)?;
        tracing::info!(root = %root_id, version = %id, "edit abandoned");
        Ok(StatusChange {
            version_id: id,
            from: current.status,
            to: PublishingStatus::Removed,
        })
    }

    // ── Resolution ──────────────────────────────────────────────────

    /// The version a read with this policy should see, as of now.
    pub fn resolve_version_id<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        root: RootId,
        status: Option<PublishingStatus>,
        ignore_tombstoned: Option<bool>,
    ) -> Result<Option<VersionId>, VersioningError> {
        self.resolve_version_id_at(uow, root, status, ignore_tombstoned, Timestamp::now())
    }

    /// [`resolve_version_id`](Self::resolve_version_id) at a given instant.
    ///
    /// - no status: newest non-Removed version; Deleted and OldPublished are
    ///   also skipped when `ignore_tombstoned` (default from configuration);
    /// - Published: newest Published version whose validity window
    ///   contains `now`;
    /// - any other status: newest version with exactly that status.
    ///
    /// Finding nothing is `Ok(None)`, not an error.
    pub fn resolve_version_id_at<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        root: RootId,
        status: Option<PublishingStatus>,
        ignore_tombstoned: Option<bool>,
        now: Timestamp,
    ) -> Result<Option<VersionId>, VersioningError> {
        let Some(history) = uow.history(root)? else {
            return Ok(None);
        };
        let list = list_versions(history, &self.registry)?;
        let found = match status {
            None => {
                let ignore = ignore_tombstoned.unwrap_or(self.resolve.ignore_tombstoned);
                list.as_slice().iter().rev().find(|s| {
                    s.status != PublishingStatus::Removed && !(ignore && s.status.is_retired())
                })
            }
            Some(PublishingStatus::Published) => list
                .all_in(&[PublishingStatus::Published])
                .into_iter()
                .rev()
                .find(|s| {
                    history
                        .version(s.version_id)
                        .is_some_and(|v| v.validity.contains(now))
                }),
            Some(other) => list.latest_in(&[other]),
        };
        Ok(found.map(|s| s.version_id))
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Attach a detached deep copy of `source` to the same root, without
    /// lineage. The caller assigns lineage and status next.
    fn attach_clone(
        &self,
        history: &mut RootHistory,
        source: VersionId,
    ) -> Result<VersionId, VersioningError> {
        let root_id = history.root_id();
        let original = history
            .version(source)
            .ok_or(VersioningError::UnknownVersion(source))?;
        let detached = self.cloner.clone_version(original);
        let clone = Version {
            id: VersionId::new(),
            root_id: Some(root_id),
            lineage_id: None,
            publishing_status: original.publishing_status,
            validity: detached.validity,
            content: detached.content,
            language_availabilities: detached.language_availabilities,
        };
        let clone_id = clone.id;
        history.push_version(clone);
        Ok(clone_id)
    }

    /// Make `version` Published at the next major number, demoting the
    /// current Published version (if another one exists) to OldPublished.
    fn promote(
        &self,
        history: &mut RootHistory,
        list: &OrderedVersions,
        version: VersionId,
        from: PublishingStatus,
    ) -> Result<Vec<StatusChange>, VersioningError> {
        let root_id = history.root_id();
        let current = list.latest_published().cloned();
        let demoted = current.clone().filter(|p| p.version_id != version);
        // Re-publishing the live version keeps its chain.
        let previous = current.map(|p| p.lineage_id);
        let major = history.max_number().map_or(0, |(major, _)| major) + 1;

        let mut changes = Vec::new();
        if let Some(old) = &demoted {
            self.set_status(history, old.version_id, PublishingStatus::OldPublished)?;
            tracing::info!(root = %root_id, version = %old.version_id, "demoted to old published");
            changes.push(StatusChange {
                version_id: old.version_id,
                from: PublishingStatus::Published,
                to: PublishingStatus::OldPublished,
            });
        }

        let lineage = VersionLineage::new(root_id, major, 0, previous);
        self.link(history, version, lineage)?;
        self.set_status(history, version, PublishingStatus::Published)?;
        tracing::info!(root = %root_id, %version, major, "published");
        changes.push(StatusChange {
            version_id: version,
            from,
            to: PublishingStatus::Published,
        });
        Ok(changes)
    }

    /// Give `version` a fresh lineage record one minor step past the
    /// root's highest number, linked to `previous`, and set its status.
    fn assign_next_minor(
        &self,
        history: &mut RootHistory,
        version: VersionId,
        status: PublishingStatus,
        previous: Option<LineageId>,
    ) -> Result<(), VersioningError> {
        let (major, minor) = history.max_number().unwrap_or((0, 0));
        let lineage = VersionLineage::new(history.root_id(), major, minor + 1, previous);
        self.link(history, version, lineage)?;
        self.set_status(history, version, status)
    }

    fn link(
        &self,
        history: &mut RootHistory,
        version: VersionId,
        lineage: VersionLineage,
    ) -> Result<(), VersioningError> {
        let record = history
            .version_mut(version)
            .ok_or(VersioningError::UnknownVersion(version))?;
        record.lineage_id = Some(lineage.id);
        history.push_lineage(lineage);
        Ok(())
    }

    fn set_status(
        &self,
        history: &mut RootHistory,
        version: VersionId,
        status: PublishingStatus,
    ) -> Result<(), VersioningError> {
        let record = history
            .version_mut(version)
            .ok_or(VersioningError::UnknownVersion(version))?;
        record.publishing_status = self.registry.id_for(status);
        Ok(())
    }
}

/// Load the history owning `id`.
pub(crate) fn load_for_version<U: UnitOfWork + ?Sized>(
    uow: &mut U,
    id: VersionId,
) -> Result<&mut RootHistory, VersioningError> {
    let root = uow
        .root_of(id)?
        .ok_or(VersioningError::UnknownVersion(id))?;
    uow.history(root)?
        .ok_or(VersioningError::UnknownVersion(id))
}

fn corrupt(root_id: RootId, reason: &str) -> VersioningError {
    VersioningError::CorruptHistory {
        root_id,
        reason: reason.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::check_invariants;
    use crate::store::{InMemoryStore, InMemoryUnitOfWork};

    fn make_manager() -> VersioningManager {
        VersioningManager::new(Arc::new(StatusRegistry::generate()))
    }

    fn make_draft(manager: &VersioningManager) -> Version {
        Version::new(
            manager.registry().id_for(PublishingStatus::Draft),
            serde_json::json!({"name": "Kela office"}),
        )
    }

    /// Create a root with one Draft version and commit it.
    fn seed(manager: &VersioningManager, store: &InMemoryStore) -> (RootId, VersionId) {
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(&mut uow, EditTarget::New(make_draft(manager)), EditMode::Standard, None)
            .unwrap();
        uow.commit().unwrap();
        (acquired.version.root_id.unwrap(), acquired.version.id)
    }

    fn seed_published(manager: &VersioningManager, store: &InMemoryStore) -> (RootId, VersionId) {
        let (root, id) = seed(manager, store);
        let mut uow = store.begin();
        manager.publish(&mut uow, id, PublishingStatus::Published).unwrap();
        uow.commit().unwrap();
        (root, id)
    }

    fn numbers(manager: &VersioningManager, uow: &mut InMemoryUnitOfWork, root: RootId) -> Vec<(PublishingStatus, (u32, u32))> {
        manager
            .list_versions(uow, root)
            .unwrap()
            .as_slice()
            .iter()
            .map(|s| (s.status, s.number()))
            .collect()
    }

    fn assert_sound(manager: &VersioningManager, store: &InMemoryStore, root: RootId) {
        let history = store.get(root).unwrap();
        let violations = check_invariants(&history, manager.registry());
        assert!(violations.is_empty(), "violations: {violations:?}");
    }

    #[test]
    fn test_new_entity_starts_as_draft_0_1() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, _) = seed(&manager, &store);
        let mut uow = store.begin();
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Draft, (0, 1))]);
    }

    #[test]
    fn test_new_entity_published_directly_starts_at_1_0() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(
                &mut uow,
                EditTarget::New(make_draft(&manager)),
                EditMode::Standard,
                Some(PublishingStatus::Published),
            )
            .unwrap();
        let root = acquired.version.root_id.unwrap();
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);
    }

    #[test]
    fn test_new_entity_takes_status_from_record() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let version = Version::new(
            manager.registry().id_for(PublishingStatus::Published),
            serde_json::json!({"name": "Kela office"}),
        );
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(&mut uow, EditTarget::New(version), EditMode::Standard, None)
            .unwrap();
        let root = acquired.version.root_id.unwrap();
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);
    }

    #[test]
    fn test_new_entity_with_retired_record_status_rejected() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let version = Version::new(
            manager.registry().id_for(PublishingStatus::Deleted),
            serde_json::Value::Null,
        );
        let mut uow = store.begin();
        let err = manager
            .acquire_editable_version(&mut uow, EditTarget::New(version), EditMode::Standard, None)
            .unwrap_err();
        assert!(matches!(err, VersioningError::IllegalTransition { .. }));
        assert!(uow.changed_roots().is_empty());
    }

    #[test]
    fn test_root_with_only_abandoned_versions_starts_again() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, draft) = seed(&manager, &store);
        let mut uow = store.begin();
        manager.abandon_version(&mut uow, draft).unwrap();
        uow.commit().unwrap();

        let mut again = make_draft(&manager);
        again.root_id = Some(root);
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(&mut uow, EditTarget::New(again), EditMode::Standard, None)
            .unwrap();
        assert_eq!(acquired.version.root_id, Some(root));
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Draft, (0, 2))]);
        manager
            .publish(&mut uow, acquired.version.id, PublishingStatus::Published)
            .unwrap();
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);
        uow.commit().unwrap();
        assert_sound(&manager, &store, root);
    }

    #[test]
    fn test_new_entity_for_versioned_root_rejected() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, _) = seed(&manager, &store);
        let mut second = make_draft(&manager);
        second.root_id = Some(root);
        let mut uow = store.begin();
        let err = manager
            .acquire_editable_version(&mut uow, EditTarget::New(second), EditMode::Standard, None)
            .unwrap_err();
        assert!(matches!(err, VersioningError::RootAlreadyVersioned(r) if r == root));
    }

    #[test]
    fn test_first_publish_is_1_0() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, id) = seed(&manager, &store);
        let mut uow = store.begin();
        let changes = manager.publish(&mut uow, id, PublishingStatus::Published).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, PublishingStatus::Draft);
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);
    }

    #[test]
    fn test_edit_published_copies_on_write() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);

        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap();
        assert!(acquired.copied);
        assert_ne!(acquired.version.id, published);
        assert_eq!(acquired.version.content, serde_json::json!({"name": "Kela office"}));
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::Published, (1, 0)), (PublishingStatus::Modified, (1, 1))]
        );
        uow.commit().unwrap();
        assert_sound(&manager, &store, root);

        let mut uow = store.begin();
        assert_eq!(
            manager.resolve_version_id(&mut uow, root, Some(PublishingStatus::Published), None).unwrap(),
            Some(published)
        );
    }

    #[test]
    fn test_continuation_bumps_minor_in_place() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let clone = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap()
            .version
            .id;
        let lineages_before = uow.history(root).unwrap().unwrap().lineages().len();

        let again = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(clone), EditMode::Standard, None)
            .unwrap();
        assert!(!again.copied);
        assert_eq!(again.version.id, clone);
        assert_eq!(uow.history(root).unwrap().unwrap().lineages().len(), lineages_before);
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::Published, (1, 0)), (PublishingStatus::Modified, (1, 2))]
        );
    }

    #[test]
    fn test_continuation_skips_number_taken_by_forced_transition() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let clone = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap()
            .version
            .id;
        manager
            .force_status(&mut uow, published, PublishingStatus::Deleted, None)
            .unwrap();
        manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(clone), EditMode::Standard, None)
            .unwrap();
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::Deleted, (1, 2)), (PublishingStatus::Modified, (1, 3))]
        );
        assert_eq!(manager.list_versions(&mut uow, root).unwrap().head().unwrap().version_id, clone);
        uow.commit().unwrap();
        assert_sound(&manager, &store, root);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let clone = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap()
            .version
            .id;
        uow.commit().unwrap();

        let mut uow = store.begin();
        let err = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap_err();
        assert!(err.requires_refetch());
        assert!(matches!(
            err,
            VersioningError::StaleHandleConflict { expected, actual, .. } if expected == clone && actual == published
        ));
    }

    #[test]
    fn test_publish_modified_demotes_previous() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let clone = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap()
            .version
            .id;
        let changes = manager.publish(&mut uow, clone, PublishingStatus::Published).unwrap();
        assert_eq!(
            changes,
            vec![
                StatusChange {
                    version_id: published,
                    from: PublishingStatus::Published,
                    to: PublishingStatus::OldPublished
                },
                StatusChange {
                    version_id: clone,
                    from: PublishingStatus::Modified,
                    to: PublishingStatus::Published
                },
            ]
        );
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::OldPublished, (1, 0)), (PublishingStatus::Published, (2, 0))]
        );
        let chain = manager.lineage_chain(&mut uow, root).unwrap();
        let chain_numbers: Vec<_> = chain.iter().map(VersionLineage::number).collect();
        assert_eq!(chain_numbers, vec![(1, 0), (2, 0)]);
        uow.commit().unwrap();
        assert_sound(&manager, &store, root);
    }

    #[test]
    fn test_publish_twice_is_noop() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        assert!(manager.publish(&mut uow, published, PublishingStatus::Published).unwrap().is_empty());
        assert!(uow.changed_roots().is_empty());
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);
    }

    #[test]
    fn test_publish_rejects_non_publish_targets() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        for target in [
            PublishingStatus::Draft,
            PublishingStatus::Deleted,
            PublishingStatus::OldPublished,
            PublishingStatus::Removed,
        ] {
            let err = manager.publish(&mut uow, published, target).unwrap_err();
            assert!(matches!(err, VersioningError::IllegalTransition { .. }), "{target}: {err}");
        }
        assert!(uow.changed_roots().is_empty());
    }

    #[test]
    fn test_language_rows_of_abandoned_version_unreachable() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let clone = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap()
            .version
            .id;
        manager.abandon_version(&mut uow, clone).unwrap();
        uow.commit().unwrap();

        let mut uow = store.begin();
        let err = manager
            .set_all_language_statuses(&mut uow, clone, PublishingStatus::Published)
            .unwrap_err();
        assert!(matches!(err, VersioningError::UnknownVersion(id) if id == clone));
        assert!(matches!(
            manager.available_languages(&mut uow, clone).unwrap_err(),
            VersioningError::UnknownVersion(_)
        ));
        assert!(manager.available_languages(&mut uow, published).unwrap().is_empty());
        assert!(uow.changed_roots().is_empty());
    }

    #[test]
    fn test_publish_as_modified_with_edit_in_progress_rejected() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap();
        let err = manager.publish(&mut uow, published, PublishingStatus::Modified).unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, VersioningError::PublishModifiedExists { .. }));
    }

    #[test]
    fn test_publish_as_modified_links_past_current() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let changes = manager.publish(&mut uow, published, PublishingStatus::Modified).unwrap();
        assert_eq!(changes[0].to, PublishingStatus::Modified);
        let history = uow.history(root).unwrap().unwrap();
        let lineage = history.lineage_of(published).unwrap();
        assert_eq!(lineage.number(), (1, 1));
        assert_eq!(lineage.previous_lineage_id, None);
    }

    #[test]
    fn test_force_status_respects_allowed_from() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let skipped = manager
            .force_status(
                &mut uow,
                published,
                PublishingStatus::Modified,
                Some(&[PublishingStatus::Deleted]),
            )
            .unwrap();
        assert!(skipped.is_none());
        assert!(uow.changed_roots().is_empty());

        let change = manager
            .force_status(&mut uow, published, PublishingStatus::Deleted, None)
            .unwrap()
            .unwrap();
        assert_eq!(change.from, PublishingStatus::Published);
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Deleted, (1, 1))]);

        let change = manager
            .force_status(
                &mut uow,
                published,
                PublishingStatus::Modified,
                Some(&[PublishingStatus::Deleted]),
            )
            .unwrap();
        assert!(change.is_some());
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Modified, (1, 2))]);
    }

    #[test]
    fn test_force_status_conflicts_with_edit_in_progress() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap();
        let err = manager
            .force_status(&mut uow, published, PublishingStatus::Modified, None)
            .unwrap_err();
        assert!(matches!(err, VersioningError::ConflictInProgress { .. }));
    }

    #[test]
    fn test_force_to_published_is_illegal() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, draft) = seed(&manager, &store);
        let mut uow = store.begin();
        let err = manager
            .force_status(&mut uow, draft, PublishingStatus::Published, None)
            .unwrap_err();
        assert!(matches!(err, VersioningError::IllegalTransition { .. }));
    }

    #[test]
    fn test_keep_previous_state_promotes_clone() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(
                &mut uow,
                EditTarget::Existing(published),
                EditMode::KeepPreviousState,
                None,
            )
            .unwrap();
        assert!(acquired.copied);
        assert_eq!(
            acquired.changes,
            vec![StatusChange {
                version_id: published,
                from: PublishingStatus::Published,
                to: PublishingStatus::OldPublished,
            }]
        );
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::OldPublished, (1, 0)), (PublishingStatus::Published, (2, 0))]
        );
        assert_eq!(
            manager.resolve_version_id(&mut uow, root, Some(PublishingStatus::Published), None).unwrap(),
            Some(acquired.version.id)
        );
    }

    #[test]
    fn test_keep_previous_state_inherits_retired_status() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        manager
            .force_status(&mut uow, published, PublishingStatus::Deleted, None)
            .unwrap();
        let acquired = manager
            .acquire_editable_version(
                &mut uow,
                EditTarget::Existing(published),
                EditMode::KeepPreviousState,
                None,
            )
            .unwrap();
        assert!(acquired.changes.is_empty());
        assert!(manager.registry().is(acquired.version.publishing_status, PublishingStatus::Deleted));
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::Deleted, (1, 1)), (PublishingStatus::Deleted, (1, 2))]
        );
    }

    #[test]
    fn test_save_and_publish_clones_published_source() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(
                &mut uow,
                EditTarget::Existing(published),
                EditMode::Standard,
                Some(PublishingStatus::Published),
            )
            .unwrap();
        assert!(acquired.copied);
        assert_eq!(
            numbers(&manager, &mut uow, root),
            vec![(PublishingStatus::OldPublished, (1, 0)), (PublishingStatus::Published, (2, 0))]
        );
    }

    #[test]
    fn test_save_and_publish_mutates_draft_in_place() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, draft) = seed(&manager, &store);
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(
                &mut uow,
                EditTarget::Existing(draft),
                EditMode::Standard,
                Some(PublishingStatus::Published),
            )
            .unwrap();
        assert!(!acquired.copied);
        assert_eq!(acquired.version.id, draft);
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);
    }

    #[test]
    fn test_removed_version_is_terminal() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, draft) = seed(&manager, &store);
        let mut uow = store.begin();
        manager.abandon_version(&mut uow, draft).unwrap();
        assert!(numbers(&manager, &mut uow, root).is_empty());
        let err = manager.publish(&mut uow, draft, PublishingStatus::Published).unwrap_err();
        assert!(matches!(err, VersioningError::UnknownVersion(_)));
    }

    #[test]
    fn test_abandon_keeps_published_version() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let clone = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap()
            .version
            .id;
        let change = manager.abandon_version(&mut uow, clone).unwrap();
        assert_eq!(change.to, PublishingStatus::Removed);
        assert_eq!(numbers(&manager, &mut uow, root), vec![(PublishingStatus::Published, (1, 0))]);

        // A fresh edit is possible again.
        let next = manager
            .acquire_editable_version(&mut uow, EditTarget::Existing(published), EditMode::Standard, None)
            .unwrap();
        assert!(next.copied);
    }

    #[test]
    fn test_abandon_published_is_illegal() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (_, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        assert!(matches!(
            manager.abandon_version(&mut uow, published).unwrap_err(),
            VersioningError::IllegalTransition { .. }
        ));
    }

    #[test]
    fn test_resolve_tombstone_policy() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);
        let mut uow = store.begin();
        manager
            .force_status(&mut uow, published, PublishingStatus::Deleted, None)
            .unwrap();
        assert_eq!(manager.resolve_version_id(&mut uow, root, None, None).unwrap(), None);
        assert_eq!(
            manager.resolve_version_id(&mut uow, root, None, Some(false)).unwrap(),
            Some(published)
        );
        assert_eq!(
            manager
                .resolve_version_id(&mut uow, root, Some(PublishingStatus::Deleted), None)
                .unwrap(),
            Some(published)
        );
    }

    #[test]
    fn test_resolve_respects_validity_window() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let from = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
        let to = Timestamp::parse("2026-12-31T00:00:00Z").unwrap();
        let version = make_draft(&manager)
            .with_validity(catver_core::ValidityWindow::new(Some(from), Some(to)).unwrap());
        let mut uow = store.begin();
        let acquired = manager
            .acquire_editable_version(
                &mut uow,
                EditTarget::New(version),
                EditMode::Standard,
                Some(PublishingStatus::Published),
            )
            .unwrap();
        let root = acquired.version.root_id.unwrap();
        let published = Some(PublishingStatus::Published);

        let inside = Timestamp::parse("2026-06-01T00:00:00Z").unwrap();
        let before = Timestamp::parse("2025-06-01T00:00:00Z").unwrap();
        assert_eq!(
            manager.resolve_version_id_at(&mut uow, root, published, None, inside).unwrap(),
            Some(acquired.version.id)
        );
        assert_eq!(
            manager.resolve_version_id_at(&mut uow, root, published, None, before).unwrap(),
            None
        );
    }

    #[test]
    fn test_resolve_unknown_root_is_none() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let mut uow = store.begin();
        assert_eq!(manager.resolve_version_id(&mut uow, RootId::new(), None, None).unwrap(), None);
        assert!(manager.list_versions(&mut uow, RootId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_list_versions_many_groups_by_root() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (a, _) = seed(&manager, &store);
        let (b, _) = seed_published(&manager, &store);
        let mut uow = store.begin();
        let grouped = manager.list_versions_many(&mut uow, &[a, b, a]).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&a].head().unwrap().status, PublishingStatus::Draft);
        assert_eq!(grouped[&b].head().unwrap().status, PublishingStatus::Published);
    }

    #[test]
    fn test_concurrent_acquire_second_commit_rejected() {
        let manager = make_manager();
        let store = InMemoryStore::new();
        let (root, published) = seed_published(&manager, &store);

        let mut first = store.begin();
        let mut second = store.begin();
        for uow in [&mut first, &mut second] {
            manager
                .acquire_editable_version(uow, EditTarget::Existing(published), EditMode::Standard, None)
                .unwrap();
        }
        first.commit().unwrap();
        let err = VersioningError::from(second.commit().unwrap_err());
        assert!(err.requires_refetch());
        assert_sound(&manager, &store, root);
    }
}

//! # Language Availability
//!
//! Each version carries one availability row per language with its own
//! publishing status and optional schedule. Rows are seeded when the
//! version is created and die with it; this module only mutates status and
//! scheduling fields of rows that already exist.
//!
//! Status comparisons go through the [`StatusRegistry`] identifiers stored
//! on the rows.

use std::collections::BTreeMap;

use catver_core::{LanguageId, PublishingStatus, StatusRegistry, Timestamp, VersionId};

use crate::engine::{load_for_version, VersioningError, VersioningManager};
use crate::history::list_versions;
use crate::model::{LanguageAvailability, LanguageStatusChange, Version};
use crate::store::UnitOfWork;

/// Which rows a bulk status update touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageFilter {
    /// Only these languages; all when unset.
    pub languages: Option<Vec<LanguageId>>,
    /// Only rows currently in this status; any when unset.
    pub current_status: Option<PublishingStatus>,
}

impl LanguageFilter {
    /// Every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to `languages`.
    pub fn languages(mut self, languages: impl IntoIterator<Item = LanguageId>) -> Self {
        self.languages = Some(languages.into_iter().collect());
        self
    }

    /// Restrict to rows currently in `status`.
    pub fn in_status(mut self, status: PublishingStatus) -> Self {
        self.current_status = Some(status);
        self
    }

    fn matches(&self, registry: &StatusRegistry, row: &LanguageAvailability) -> bool {
        let language_ok = self
            .languages
            .as_ref()
            .map_or(true, |ls| ls.contains(&row.language_id));
        let status_ok = self
            .current_status
            .map_or(true, |s| registry.is(row.status, s));
        language_ok && status_ok
    }
}

// ─── Pure row operations ─────────────────────────────────────────────

/// Set every row matching `filter` to `status`.
pub fn set_status_where(
    registry: &StatusRegistry,
    version: &mut Version,
    status: PublishingStatus,
    filter: &LanguageFilter,
) -> Result<Vec<LanguageStatusChange>, VersioningError> {
    let target = registry.id_for(status);
    let current = decode_rows(registry, version)?;
    let mut changes = Vec::new();
    for (row, from) in version.language_availabilities.iter_mut().zip(current) {
        if !filter.matches(registry, row) {
            continue;
        }
        row.status = target;
        changes.push(LanguageStatusChange {
            language_id: row.language_id.clone(),
            from,
            to: status,
        });
    }
    Ok(changes)
}

/// Set every row to `status`.
pub fn set_all(
    registry: &StatusRegistry,
    version: &mut Version,
    status: PublishingStatus,
) -> Result<Vec<LanguageStatusChange>, VersioningError> {
    set_status_where(registry, version, status, &LanguageFilter::all())
}

/// Apply a per-language desired status to the rows that exist.
///
/// Languages in `desired` without a row are ignored. Moving into Published
/// clears `publish_at` and `last_failed_publish_at`; moving into Deleted
/// clears every scheduling field.
pub fn apply_status_map(
    registry: &StatusRegistry,
    version: &mut Version,
    desired: &BTreeMap<LanguageId, PublishingStatus>,
) -> Result<Vec<LanguageStatusChange>, VersioningError> {
    let current = decode_rows(registry, version)?;
    let mut changes = Vec::new();
    for (row, from) in version.language_availabilities.iter_mut().zip(current) {
        let Some(&status) = desired.get(&row.language_id) else {
            continue;
        };
        transition_row(registry, row, status);
        changes.push(LanguageStatusChange {
            language_id: row.language_id.clone(),
            from,
            to: status,
        });
    }
    Ok(changes)
}

/// Apply due schedules: `publish_at <= now` publishes the language,
/// `archive_at <= now` archives it (Deleted). Archive wins when both are due.
pub fn run_due_schedules(
    registry: &StatusRegistry,
    version: &mut Version,
    now: Timestamp,
) -> Result<Vec<LanguageStatusChange>, VersioningError> {
    let current = decode_rows(registry, version)?;
    let mut changes = Vec::new();
    for (row, from) in version.language_availabilities.iter_mut().zip(current) {
        let publish_due = row.publish_at.is_some_and(|at| at <= now);
        let archive_due = row.archive_at.is_some_and(|at| at <= now);
        let status = match (publish_due, archive_due) {
            (_, true) => PublishingStatus::Deleted,
            (true, false) => PublishingStatus::Published,
            (false, false) => continue,
        };
        transition_row(registry, row, status);
        changes.push(LanguageStatusChange {
            language_id: row.language_id.clone(),
            from,
            to: status,
        });
    }
    Ok(changes)
}

/// Decode every row's status up front so a bad identifier fails the
/// operation before any row is written.
fn decode_rows(
    registry: &StatusRegistry,
    version: &Version,
) -> Result<Vec<PublishingStatus>, VersioningError> {
    version
        .language_availabilities
        .iter()
        .map(|row| registry.status_of(row.status).map_err(VersioningError::from))
        .collect()
}

fn transition_row(registry: &StatusRegistry, row: &mut LanguageAvailability, status: PublishingStatus) {
    row.status = registry.id_for(status);
    match status {
        PublishingStatus::Published => {
            row.publish_at = None;
            row.last_failed_publish_at = None;
        }
        PublishingStatus::Deleted => {
            row.publish_at = None;
            row.archive_at = None;
            row.last_failed_publish_at = None;
        }
        _ => {}
    }
}

fn row_mut<'v>(
    version: &'v mut Version,
    language: &LanguageId,
) -> Result<&'v mut LanguageAvailability, VersioningError> {
    let version_id = version.id;
    version
        .language_mut(language)
        .ok_or_else(|| VersioningError::UnknownLanguage {
            version_id,
            language_id: language.clone(),
        })
}

// ─── Engine entry points ─────────────────────────────────────────────

impl VersioningManager {
    fn with_version<U, T>(
        &self,
        uow: &mut U,
        id: VersionId,
        apply: impl FnOnce(&StatusRegistry, &mut Version) -> Result<T, VersioningError>,
    ) -> Result<T, VersioningError>
    where
        U: UnitOfWork + ?Sized,
    {
        let history = load_for_version(uow, id)?;
        if list_versions(history, &self.registry)?.get(id).is_none() {
            return Err(VersioningError::UnknownVersion(id));
        }
        let version = history
            .version_mut(id)
            .ok_or(VersioningError::UnknownVersion(id))?;
        apply(self.registry.as_ref(), version)
    }

    /// Languages in which the version is published.
    pub fn available_languages<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
    ) -> Result<Vec<LanguageId>, VersioningError> {
        self.with_version(uow, id, |registry, version| {
            Ok(version
                .language_availabilities
                .iter()
                .filter(|row| registry.is(row.status, PublishingStatus::Published))
                .map(|row| row.language_id.clone())
                .collect())
        })
    }

    /// Bulk status update of the rows matching `filter`.
    pub fn set_language_status_where<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        status: PublishingStatus,
        filter: &LanguageFilter,
    ) -> Result<Vec<LanguageStatusChange>, VersioningError> {
        self.with_version(uow, id, |registry, version| {
            set_status_where(registry, version, status, filter)
        })
    }

    /// Per-language status update with schedule clearing.
    pub fn set_language_statuses<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        desired: &BTreeMap<LanguageId, PublishingStatus>,
    ) -> Result<Vec<LanguageStatusChange>, VersioningError> {
        self.with_version(uow, id, |registry, version| {
            apply_status_map(registry, version, desired)
        })
    }

    /// Every row to one status.
    pub fn set_all_language_statuses<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        status: PublishingStatus,
    ) -> Result<Vec<LanguageStatusChange>, VersioningError> {
        self.with_version(uow, id, |registry, version| set_all(registry, version, status))
    }

    /// Schedule a language to be published at `at`.
    pub fn schedule_publish<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        language: &LanguageId,
        at: Timestamp,
    ) -> Result<(), VersioningError> {
        self.with_version(uow, id, |_, version| {
            row_mut(version, language)?.publish_at = Some(at);
            Ok(())
        })
    }

    /// Schedule a language to be archived at `at`.
    pub fn schedule_archive<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        language: &LanguageId,
        at: Timestamp,
    ) -> Result<(), VersioningError> {
        self.with_version(uow, id, |_, version| {
            row_mut(version, language)?.archive_at = Some(at);
            Ok(())
        })
    }

    /// Record that a scheduled publish of `language` failed at `at`.
    pub fn record_failed_publish<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        language: &LanguageId,
        at: Timestamp,
    ) -> Result<(), VersioningError> {
        self.with_version(uow, id, |_, version| {
            let row = row_mut(version, language)?;
            tracing::warn!(version = %id, language = %language, "scheduled language publish failed");
            row.last_failed_publish_at = Some(at);
            Ok(())
        })
    }

    /// Apply every schedule of the version that is due at `now`.
    pub fn run_due_schedules<U: UnitOfWork + ?Sized>(
        &self,
        uow: &mut U,
        id: VersionId,
        now: Timestamp,
    ) -> Result<Vec<LanguageStatusChange>, VersioningError> {
        let changes =
            self.with_version(uow, id, |registry, version| run_due_schedules(registry, version, now))?;
        if !changes.is_empty() {
            tracing::info!(version = %id, count = changes.len(), "applied due language schedules");
        }
        Ok(changes)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

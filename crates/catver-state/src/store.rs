//! # Persistence Seam and In-Memory Unit of Work
//!
//! The engine never talks to storage directly. It operates on root
//! histories handed out by a [`UnitOfWork`], which represents the caller's
//! transaction: every change stays inside it until the caller commits, and
//! dropping it without committing discards everything.
//!
//! ## Optimistic Concurrency
//!
//! [`InMemoryStore`] keeps a lineage stamp per root. A unit of work records
//! the stamp of every root it loads. On [`InMemoryUnitOfWork::commit()`],
//! every root it changed must still carry the recorded stamp; otherwise the
//! whole commit is rejected with [`StoreError::StaleRoot`] and nothing is
//! written. This closes the gap where two transactions both pass the
//! "no edit in progress" check before either writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use catver_core::{RootId, VersionId};

use crate::history::RootHistory;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by a unit of work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No root with this identifier exists.
    #[error("root {0} not found")]
    RootNotFound(RootId),

    /// A root with this identifier already exists.
    #[error("root {0} already exists")]
    RootExists(RootId),

    /// The root changed in another transaction since it was loaded.
    #[error("root {root_id} changed concurrently (loaded at stamp {loaded}, now {current})")]
    StaleRoot {
        /// The contended root.
        root_id: RootId,
        /// Stamp observed when loaded.
        loaded: u64,
        /// Stamp at commit time.
        current: u64,
    },

    /// The same physical version identifier is stored under two roots.
    #[error("version {version_id} already belongs to root {owner}")]
    VersionOwnedElsewhere {
        /// The version.
        version_id: VersionId,
        /// The root already owning it.
        owner: RootId,
    },
}

// ─── Unit of Work ────────────────────────────────────────────────────

/// The caller's transaction as seen by the engine.
pub trait UnitOfWork {
    /// The history of an existing root, loaded into this unit of work.
    ///
    /// Returns `Ok(None)` when the root does not exist.
    fn history(&mut self, root: RootId) -> Result<Option<&mut RootHistory>, StoreError>;

    /// Register an empty history for a new root.
    fn create_root(&mut self, root: RootId) -> Result<&mut RootHistory, StoreError>;

    /// The root a physical version belongs to.
    fn root_of(&mut self, version: VersionId) -> Result<Option<RootId>, StoreError>;
}

// ─── In-Memory Store ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredRoot {
    history: RootHistory,
    stamp: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    roots: BTreeMap<RootId, StoredRoot>,
    version_index: HashMap<VersionId, RootId>,
}

/// Shared in-memory store of root histories.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a unit of work.
    pub fn begin(&self) -> InMemoryUnitOfWork {
        InMemoryUnitOfWork {
            store: self.clone(),
            loaded: BTreeMap::new(),
        }
    }

    /// Copy of one root's committed history.
    pub fn get(&self, root: RootId) -> Option<RootHistory> {
        self.state.read().roots.get(&root).map(|r| r.history.clone())
    }

    /// Copies of every committed history, ordered by root identifier.
    pub fn snapshot(&self) -> Vec<RootHistory> {
        self.state
            .read()
            .roots
            .values()
            .map(|r| r.history.clone())
            .collect()
    }

    /// Committed stamp of a root.
    pub fn stamp(&self, root: RootId) -> Option<u64> {
        self.state.read().roots.get(&root).map(|r| r.stamp)
    }

    pub fn root_count(&self) -> usize {
        self.state.read().roots.len()
    }
}

#[derive(Debug)]
struct LoadedRoot {
    pristine: Option<RootHistory>,
    working: RootHistory,
    stamp: Option<u64>,
}

impl LoadedRoot {
    fn is_changed(&self) -> bool {
        self.pristine.as_ref() != Some(&self.working)
    }
}

/// A transaction against an [`InMemoryStore`].
///
/// Roots are snapshotted lazily on first access. Dropping without
/// [`commit()`](Self::commit) rolls back.
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    store: InMemoryStore,
    loaded: BTreeMap<RootId, LoadedRoot>,
}

impl InMemoryUnitOfWork {
    fn load(&mut self, root: RootId) -> Option<&mut LoadedRoot> {
        if !self.loaded.contains_key(&root) {
            let stored = self.store.state.read().roots.get(&root).cloned()?;
            self.loaded.insert(
                root,
                LoadedRoot {
                    pristine: Some(stored.history.clone()),
                    working: stored.history,
                    stamp: Some(stored.stamp),
                },
            );
        }
        self.loaded.get_mut(&root)
    }

    /// Roots this unit of work has changed so far.
    pub fn changed_roots(&self) -> Vec<RootId> {
        self.loaded
            .iter()
            .filter(|(_, l)| l.is_changed())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Write every changed root back to the store.
    ///
    /// Fails without writing anything if any changed root was modified by
    /// another transaction after this one loaded it, or if a root created
    /// here was created elsewhere in the meantime.
    pub fn commit(self) -> Result<(), StoreError> {
        let mut state = self.store.state.write();

        let changed: Vec<LoadedRoot> = self
            .loaded
            .into_values()
            .filter(LoadedRoot::is_changed)
            .collect();

        for root in &changed {
            let root_id = root.working.root_id();
            let current = state.roots.get(&root_id).map(|r| r.stamp);
            match (root.stamp, current) {
                (Some(loaded), Some(current)) if loaded != current => {
                    tracing::warn!(root = %root_id, loaded, current, "commit rejected: root changed concurrently");
                    return Err(StoreError::StaleRoot {
                        root_id,
                        loaded,
                        current,
                    });
                }
                (Some(loaded), None) => {
                    return Err(StoreError::StaleRoot {
                        root_id,
                        loaded,
                        current: 0,
                    });
                }
                (None, Some(_)) => return Err(StoreError::RootExists(root_id)),
                _ => {}
            }
            for version in root.working.versions() {
                if let Some(owner) = state.version_index.get(&version.id) {
                    if *owner != root_id {
                        return Err(StoreError::VersionOwnedElsewhere {
                            version_id: version.id,
                            owner: *owner,
                        });
                    }
                }
            }
        }

        for root in changed {
            let root_id = root.working.root_id();
            for version in root.working.versions() {
                state.version_index.insert(version.id, root_id);
            }
            let stamp = root.stamp.map_or(1, |s| s + 1);
            tracing::debug!(root = %root_id, stamp, "committed root history");
            state.roots.insert(
                root_id,
                StoredRoot {
                    history: root.working,
                    stamp,
                },
            );
        }
        Ok(())
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn history(&mut self, root: RootId) -> Result<Option<&mut RootHistory>, StoreError> {
        Ok(self.load(root).map(|l| &mut l.working))
    }

    fn create_root(&mut self, root: RootId) -> Result<&mut RootHistory, StoreError> {
        if self.load(root).is_some() {
            return Err(StoreError::RootExists(root));
        }
        let entry = self.loaded.entry(root).or_insert_with(|| LoadedRoot {
            pristine: None,
            working: RootHistory::new(root),
            stamp: None,
        });
        Ok(&mut entry.working)
    }

    fn root_of(&mut self, version: VersionId) -> Result<Option<RootId>, StoreError> {
        let local = self
            .loaded
            .iter()
            .find(|(_, l)| l.working.version(version).is_some())
            .map(|(id, _)| *id);
        if local.is_some() {
            return Ok(local);
        }
        Ok(self.store.state.read().version_index.get(&version).copied())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

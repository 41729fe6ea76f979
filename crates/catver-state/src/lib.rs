//! # catver-state — Version Lifecycle and Publishing State
//!
//! Implements the versioning engine for catalog entities. A root keeps every
//! physical version it ever had; the engine decides when a new physical
//! version is needed, how `(major, minor)` numbers advance, and which
//! version a read sees.
//!
//! ## Components
//!
//! - **History** (`history.rs`): the per-root arena and the ordered,
//!   read-only version list with "latest matching" selectors.
//!
//! - **Engine** (`engine.rs`): acquire-for-edit with copy-on-write, forced
//!   transitions, publish with demotion, abandon, and version resolution.
//!
//! - **Language availability** (`language.rs`): per-language status rows,
//!   bulk updates, and publish/archive schedules.
//!
//! - **Store** (`store.rs`): the [`UnitOfWork`] seam and an in-memory
//!   implementation with per-root optimistic stamps.
//!
//! - **Invariants** (`invariants.rs`): a checker for the per-root rules,
//!   used by tests and by `catver check`.
//!
//! ## Design
//!
//! The engine is stateless apart from its immutable collaborators (status
//! registry, entity cloner, resolution defaults). Every operation reads the
//! root history fresh from the caller's unit of work and performs all checks
//! before its first write.

pub mod cloner;
pub mod engine;
pub mod history;
pub mod invariants;
pub mod language;
pub mod model;
pub mod store;

// ─── History re-exports ─────────────────────────────────────────────

pub use history::{list_versions, OrderedVersions, RootHistory};

// ─── Engine re-exports ──────────────────────────────────────────────

pub use cloner::{DeepCloner, DetachedVersion, EntityCloner};
pub use engine::{Acquired, EditMode, EditTarget, VersioningError, VersioningManager};

// ─── Model re-exports ───────────────────────────────────────────────

pub use model::{
    LanguageAvailability, LanguageStatusChange, StatusChange, Version, VersionLineage,
    VersionSummary,
};

// ─── Language re-exports ────────────────────────────────────────────

pub use language::LanguageFilter;

// ─── Store re-exports ───────────────────────────────────────────────

pub use store::{InMemoryStore, InMemoryUnitOfWork, StoreError, UnitOfWork};

// ─── Invariant re-exports ───────────────────────────────────────────

pub use invariants::{check_invariants, InvariantViolation};

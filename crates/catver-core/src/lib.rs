//! # catver-core — Foundational Types for the Catalog Versioning Engine
//!
//! Every catalog entity (organization, service channel, service, service
//! collection, general description) is a stable **root** with many physical
//! **versions**. This crate defines the vocabulary shared by the engine and
//! its callers. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `RootId`, `VersionId`,
//!    `LineageId`, `LanguageId`. You cannot pass a version identifier where
//!    a root identifier is expected.
//!
//! 2. **Statuses are compared by registry identifier.** The six publishing
//!    statuses are a closed enum, but persisted records carry an opaque
//!    [`StatusId`]. All translation flows through [`StatusRegistry`], which
//!    is built once at startup and shared immutably.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] enforces UTC with seconds
//!    precision; validity windows and language schedules are expressed in it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `catver-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod identity;
pub mod status;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use config::{EngineConfig, ResolveConfig};
pub use error::{CatverError, RegistryError, ValidationError};
pub use identity::{LanguageId, LineageId, RootId, VersionId};
pub use status::{PublishingStatus, StatusId, StatusRegistry};
pub use temporal::{Timestamp, ValidityWindow};

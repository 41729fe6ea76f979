//! # Error Types
//!
//! Errors raised by the foundational layer. All errors use `thiserror`.
//! Engine-level errors (illegal transitions, in-progress conflicts) live in
//! `catver-state`, next to the state machine that raises them.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum CatverError {
    /// Status registry construction or lookup failed.
    #[error("status registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A domain value failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Engine configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error translating between publishing statuses and registry identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The status name is not one of the six known statuses.
    #[error("unknown publishing status name: {0:?}")]
    UnknownName(String),

    /// No status is registered under this identifier.
    #[error("no publishing status registered for identifier {0}")]
    UnknownId(String),

    /// A known status has no identifier in the mapping.
    #[error("publishing status {0} has no registered identifier")]
    Missing(String),

    /// Two statuses share the same identifier.
    #[error("identifier {id} is registered for both {first} and {second}")]
    DuplicateId {
        /// The shared identifier.
        id: String,
        /// First status using it.
        first: String,
        /// Second status using it.
        second: String,
    },
}

/// A domain value failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Language code is not 2-3 lowercase ASCII letters.
    #[error("invalid language code {0:?}: expected 2-3 lowercase ASCII letters")]
    InvalidLanguage(String),

    /// Timestamp could not be parsed or is not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Validity window ends before it starts.
    #[error("validity window ends ({to}) before it starts ({from})")]
    InvertedWindow {
        /// Window start.
        from: String,
        /// Window end.
        to: String,
    },
}

//! # Identity Newtypes
//!
//! Identifiers for roots, physical versions, lineage records, and languages.
//! Each identifier is a distinct type: a [`VersionId`] cannot be passed
//! where a [`RootId`] is expected.
//!
//! ## Validation
//!
//! UUID-based identifiers are always valid by construction. [`LanguageId`]
//! validates its code at construction and at deserialization time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Implements the shared surface of a UUID-backed identifier: random
/// construction, UUID access, `Display` with a namespace prefix, and
/// `FromStr` accepting either the bare or the prefixed form.
macro_rules! uuid_identifier {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Uuid::from_str(raw).map(Self)
            }
        }
    };
}

/// Stable logical identity of a catalog entity, independent of any version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootId(Uuid);

/// Identifier of one physical version (snapshot) of a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(Uuid);

/// Identifier of a lineage (version numbering) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineageId(Uuid);

uuid_identifier!(RootId, "root");
uuid_identifier!(VersionId, "version");
uuid_identifier!(LineageId, "lineage");

/// A content language, identified by its lowercase ISO 639 code (`fi`, `sv`,
/// `en`, `smn`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LanguageId(String);

impl LanguageId {
    /// Create a language identifier, validating the code.
    ///
    /// Codes must be 2-3 lowercase ASCII letters.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        let valid = (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase());
        if !valid {
            return Err(ValidationError::InvalidLanguage(code));
        }
        Ok(Self(code))
    }

    /// The language code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for LanguageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for LanguageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LanguageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

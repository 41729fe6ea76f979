//! # Temporal Types — UTC Timestamps and Validity Windows
//!
//! [`Timestamp`] is a UTC-only instant truncated to seconds. It stamps
//! lineage records (`modified_at`), language schedules (`publish_at`,
//! `archive_at`), and the validity window of a published version.
//!
//! Non-UTC inputs are rejected by [`Timestamp::parse()`]; there is no
//! silent offset conversion on the strict path.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ValidationError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// This instant shifted by `delta`, saturating at the representable range.
    pub fn shifted(&self, delta: Duration) -> Self {
        Self(self.0.checked_add_signed(delta).unwrap_or(self.0))
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Optional scheduling window restricting when a published version is live.
///
/// An unset bound is open. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// Earliest instant the version is live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<Timestamp>,
    /// Latest instant the version is live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<Timestamp>,
}

impl ValidityWindow {
    /// A window with no bounds; always live.
    pub const UNBOUNDED: Self = Self {
        valid_from: None,
        valid_to: None,
    };

    /// Build a window, rejecting one that ends before it starts.
    pub fn new(
        valid_from: Option<Timestamp>,
        valid_to: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        if let (Some(from), Some(to)) = (valid_from, valid_to) {
            if to < from {
                return Err(ValidationError::InvertedWindow {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        Ok(Self {
            valid_from,
            valid_to,
        })
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.valid_from.is_none() && self.valid_to.is_none()
    }

    /// Whether `now` falls inside `[valid_from, valid_to]`.
    pub fn contains(&self, now: Timestamp) -> bool {
        self.valid_from.map_or(true, |from| from <= now)
            && self.valid_to.map_or(true, |to| now <= to)
    }
}

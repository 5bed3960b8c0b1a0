// crates/bhd-assist-core/src/core/time.rs
// ============================================================================
// Module: BHD Assist Audit Timestamps
// Description: UTC timestamps with microsecond precision for audit entries.
// Purpose: Give audit records a stable, sortable textual timestamp.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Audit timestamps are UTC and truncated to microseconds so that the
//! rendered form (`2026-01-02T03:04:05.000006Z`) round-trips exactly. The
//! writer uses [`AuditTimestamp::successor`] to keep timestamps strictly
//! increasing within one log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use time::Duration;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC timestamp truncated to microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuditTimestamp(OffsetDateTime);

impl AuditTimestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// Builds a timestamp from microseconds since the Unix epoch.
    ///
    /// Returns `None` when the value is outside the representable range.
    #[must_use]
    pub fn from_unix_micros(micros: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
            .ok()
            .map(Self::from_datetime)
    }

    /// Returns microseconds since the Unix epoch.
    #[must_use]
    pub fn unix_micros(self) -> i128 {
        self.0.unix_timestamp_nanos() / 1_000
    }

    /// Returns the smallest timestamp strictly greater than `self`.
    #[must_use]
    pub fn successor(self) -> Self {
        self.0.checked_add(Duration::microseconds(1)).map_or(self, Self)
    }

    /// Returns `self`, or the successor of `floor` when `self` is not later.
    #[must_use]
    pub fn at_least_after(self, floor: Option<Self>) -> Self {
        match floor {
            Some(previous) if self <= previous => previous.successor(),
            _ => self,
        }
    }

    /// Renders the timestamp as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Format`] for years outside `0..=9999`.
    pub fn render(self) -> Result<String, time::error::Format> {
        self.0.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
        ))
    }

    /// Parses a timestamp produced by [`AuditTimestamp::render`].
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the text is not in the rendered form.
    pub fn parse(text: &str) -> Result<Self, time::error::Parse> {
        let parsed = PrimitiveDateTime::parse(
            text,
            format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
            ),
        )?;
        Ok(Self::from_datetime(parsed.assume_utc()))
    }

    /// Truncates a date-time to microseconds and converts it to UTC.
    fn from_datetime(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(time::UtcOffset::UTC);
        let micros = utc.nanosecond() / 1_000 * 1_000;
        Self(utc.replace_nanosecond(micros).unwrap_or(utc))
    }
}

impl fmt::Display for AuditTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl Serialize for AuditTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = self.render().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&rendered)
    }
}

impl<'de> Deserialize<'de> for AuditTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::AuditTimestamp;

    #[test]
    fn render_and_parse_are_inverse() {
        let stamp = AuditTimestamp::from_unix_micros(1_767_323_045_000_006).unwrap();
        let rendered = stamp.render().unwrap();
        assert_eq!(rendered, "2026-01-02T03:04:05.000006Z");
        assert_eq!(AuditTimestamp::parse(&rendered).unwrap(), stamp);
    }

    #[test]
    fn at_least_after_forces_strict_increase() {
        let earlier = AuditTimestamp::from_unix_micros(10).unwrap();
        let later = AuditTimestamp::from_unix_micros(20).unwrap();
        assert_eq!(later.at_least_after(Some(earlier)), later);
        assert_eq!(earlier.at_least_after(Some(later)).unix_micros(), 21);
        assert_eq!(earlier.at_least_after(Some(earlier)).unix_micros(), 11);
        assert_eq!(earlier.at_least_after(None), earlier);
    }
}

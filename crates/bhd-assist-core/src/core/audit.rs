// crates/bhd-assist-core/src/core/audit.rs
// ============================================================================
// Module: BHD Assist Decision Log Model
// Description: Decision events, log entries, and detail redaction.
// Purpose: Guarantee that every logged detail map is redacted before use.
// Dependencies: serde, crate::core::{level, time}
// ============================================================================

//! ## Overview
//! A [`DecisionLogEntry`] can only be built from [`RedactedDetails`], and
//! [`RedactedDetails`] can only be produced by a [`Redactor`]. Redaction is
//! therefore applied before construction; there is no way to attach raw
//! details to an entry and no unredact path.
//!
//! Security posture: details are treated as potentially sensitive; values
//! are replaced, keys and the event type are always kept.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::level::AssistanceLevel;
use crate::core::time::AuditTimestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel written in place of redacted values.
pub const REDACTED_SENTINEL: &str = "[REDACTED]";

/// Detail keys redacted by default (matched as case-insensitive substrings).
pub const DEFAULT_REDACTED_KEYS: &[&str] = &[
    "pattern",
    "matched_text",
    "password",
    "secret",
    "token",
    "api_key",
    "credential",
    "authorization",
    "cookie",
    "email",
];

/// Value fragments that mark a value as a credential (case-insensitive).
const CREDENTIAL_MARKERS: &[&str] = &["password=", "bearer ", "-----begin", "api_key"];

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Kind of decision recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionEvent {
    /// An assistance level was resolved from a request context.
    LevelResolved,
    /// Candidate content passed the guard.
    ContentAllowed,
    /// Candidate content was blocked by the guard.
    ContentBlocked,
    /// A playbook selection was computed.
    PlaybookSelected,
    /// An external export finished.
    ExportCompleted,
    /// A request context was rejected (reserved level).
    ContextRejected,
}

impl DecisionEvent {
    /// Returns the stable snake-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LevelResolved => "level_resolved",
            Self::ContentAllowed => "content_allowed",
            Self::ContentBlocked => "content_blocked",
            Self::PlaybookSelected => "playbook_selected",
            Self::ExportCompleted => "export_completed",
            Self::ContextRejected => "context_rejected",
        }
    }
}

impl fmt::Display for DecisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Detail map that has passed through a [`Redactor`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedactedDetails {
    /// Redacted values keyed by detail name.
    values: BTreeMap<String, String>,
    /// True when at least one value was replaced.
    redacted: bool,
}

impl RedactedDetails {
    /// Returns the redacted detail values.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Returns true when at least one value was replaced.
    #[must_use]
    pub const fn is_redacted(&self) -> bool {
        self.redacted
    }
}

/// Replaces sensitive detail values with [`REDACTED_SENTINEL`].
///
/// # Invariants
/// - Keys are never removed; only values are replaced.
/// - Key matching is case-insensitive substring matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redactor {
    /// Lowercased key fragments that force redaction.
    keys: BTreeSet<String>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::with_extra_keys(std::iter::empty::<String>())
    }
}

impl Redactor {
    /// Builds a redactor with the default keys plus `extra` keys.
    #[must_use]
    pub fn with_extra_keys<I, K>(extra: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = DEFAULT_REDACTED_KEYS
            .iter()
            .map(|key| (*key).to_string())
            .chain(extra.into_iter().map(|key| key.as_ref().trim().to_ascii_lowercase()))
            .filter(|key| !key.is_empty())
            .collect();
        Self {
            keys,
        }
    }

    /// Redacts a detail map.
    #[must_use]
    pub fn redact(&self, details: BTreeMap<String, String>) -> RedactedDetails {
        let mut redacted = false;
        let values = details
            .into_iter()
            .map(|(key, value)| {
                if self.is_sensitive(&key, &value) {
                    redacted = true;
                    (key, REDACTED_SENTINEL.to_string())
                } else {
                    (key, value)
                }
            })
            .collect();
        RedactedDetails {
            values,
            redacted,
        }
    }

    /// Returns true when a key or value must be redacted.
    fn is_sensitive(&self, key: &str, value: &str) -> bool {
        if value == REDACTED_SENTINEL {
            return false;
        }
        let key = key.to_ascii_lowercase();
        if self.keys.iter().any(|fragment| key.contains(fragment.as_str())) {
            return true;
        }
        let value_lower = value.to_ascii_lowercase();
        CREDENTIAL_MARKERS.iter().any(|marker| value_lower.contains(marker))
            || value.split_whitespace().any(looks_like_email)
    }
}

/// Returns true for tokens shaped like `local@domain.tld`.
fn looks_like_email(token: &str) -> bool {
    let token = token.trim_matches(|c: char| matches!(c, '<' | '>' | ',' | ';' | '"' | '\''));
    let Some((local, domain)) = token.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty()
        && !host.is_empty()
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && !domain.contains('@')
}

// ============================================================================
// SECTION: Log Entry
// ============================================================================

/// Append-only record of one policy decision.
///
/// # Invariants
/// - `details` were redacted before construction.
/// - `redacted` is true exactly when some value was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    /// Wall-clock time of the decision (UTC, microseconds).
    timestamp: AuditTimestamp,
    /// Decision kind.
    event_type: DecisionEvent,
    /// Level the decision was made at.
    assistance_level: AssistanceLevel,
    /// Redacted details.
    details: BTreeMap<String, String>,
    /// True when any detail value was redacted.
    redacted: bool,
}

impl DecisionLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        event_type: DecisionEvent,
        assistance_level: AssistanceLevel,
        details: RedactedDetails,
    ) -> Self {
        Self {
            timestamp: AuditTimestamp::now(),
            event_type,
            assistance_level,
            details: details.values,
            redacted: details.redacted,
        }
    }

    /// Returns the entry timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> AuditTimestamp {
        self.timestamp
    }

    /// Returns the decision kind.
    #[must_use]
    pub const fn event_type(&self) -> DecisionEvent {
        self.event_type
    }

    /// Returns the level the decision was made at.
    #[must_use]
    pub const fn assistance_level(&self) -> AssistanceLevel {
        self.assistance_level
    }

    /// Returns the redacted details.
    #[must_use]
    pub const fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// Returns a detail value.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    /// Returns true when any detail value was redacted.
    #[must_use]
    pub const fn is_redacted(&self) -> bool {
        self.redacted
    }

    /// Returns the entry re-stamped so it is strictly later than `floor`.
    #[must_use]
    pub(crate) fn stamped_after(mut self, floor: Option<AuditTimestamp>) -> Self {
        self.timestamp = self.timestamp.at_least_after(floor);
        self
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::REDACTED_SENTINEL;
    use super::Redactor;

    fn details(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn default_keys_and_value_markers_are_redacted() {
        let redacted = Redactor::default().redact(details(&[
            ("pattern", r"\bbackdoor\b"),
            ("Session_Token", "abc"),
            ("note", "contact admin@example.com"),
            ("header", "Bearer eyJhbGci"),
            ("rule_id", "always-009"),
        ]));
        let values = redacted.values();
        assert!(redacted.is_redacted());
        assert_eq!(values["pattern"], REDACTED_SENTINEL);
        assert_eq!(values["Session_Token"], REDACTED_SENTINEL);
        assert_eq!(values["note"], REDACTED_SENTINEL);
        assert_eq!(values["header"], REDACTED_SENTINEL);
        assert_eq!(values["rule_id"], "always-009");
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn clean_details_are_not_marked_redacted() {
        let redacted = Redactor::default()
            .redact(details(&[("source", "report_draft"), ("host", "10.0.0.5")]));
        assert!(!redacted.is_redacted());
    }

    #[test]
    fn extra_keys_extend_defaults() {
        let redactor = Redactor::with_extra_keys(["Client_Name"]);
        let redacted = redactor.redact(details(&[("client_name", "Acme"), ("secret", "x")]));
        assert_eq!(redacted.values()["client_name"], REDACTED_SENTINEL);
        assert_eq!(redacted.values()["secret"], REDACTED_SENTINEL);
    }
}

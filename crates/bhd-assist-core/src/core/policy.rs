// crates/bhd-assist-core/src/core/policy.rs
// ============================================================================
// Module: BHD Assist Content Policy Model
// Description: Declarative disallowed-pattern rules and guard verdicts.
// Purpose: Describe what the content guard blocks and report why.
// Dependencies: serde, crate::core::{error, identifiers, level}
// ============================================================================

//! ## Overview
//! A [`PatternRule`] pairs a regular expression with a [`PatternScope`].
//! `always` rules apply at every assistance level; level-scoped rules apply
//! only at the level they name. Rules are data: compiling and evaluating
//! them lives in [`crate::runtime::catalog`] and [`crate::runtime::guard`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ConfigurationError;
use crate::core::identifiers::PatternId;
use crate::core::level::AssistanceLevel;

// ============================================================================
// SECTION: Pattern Scope
// ============================================================================

/// Prefix for level-scoped pattern scopes.
const LEVEL_SCOPE_PREFIX: &str = "level:";

/// Levels at which a pattern rule applies.
///
/// # Invariants
/// - `Level` never holds [`AssistanceLevel::Reserved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PatternScope {
    /// Applies at every assistance level.
    Always,
    /// Applies only at the named level.
    Level(AssistanceLevel),
}

impl PatternScope {
    /// Returns true when the scope is active at `level`.
    #[must_use]
    pub fn applies_to(self, level: AssistanceLevel) -> bool {
        match self {
            Self::Always => true,
            Self::Level(scoped) => scoped == level,
        }
    }
}

impl fmt::Display for PatternScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::Level(level) => write!(f, "{LEVEL_SCOPE_PREFIX}{}", level.as_str()),
        }
    }
}

impl FromStr for PatternScope {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("always") {
            return Ok(Self::Always);
        }
        let Some(level) = trimmed.strip_prefix(LEVEL_SCOPE_PREFIX) else {
            return Err(ConfigurationError::UnknownScope(value.to_string()));
        };
        match level.parse::<AssistanceLevel>() {
            Ok(level) => Ok(Self::Level(level)),
            Err(ConfigurationError::ReservedLevel) => Err(ConfigurationError::ReservedLevel),
            Err(_) => Err(ConfigurationError::UnknownScope(value.to_string())),
        }
    }
}

impl TryFrom<String> for PatternScope {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatternScope> for String {
    fn from(value: PatternScope) -> Self {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Pattern Rule
// ============================================================================

/// Declarative disallowed-content rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternRule {
    /// Stable rule identifier reported in verdicts.
    pub id: PatternId,
    /// Regular expression, matched case-insensitively.
    pub pattern: String,
    /// Levels at which the rule applies.
    pub scope: PatternScope,
    /// Optional operator-facing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PatternRule {
    /// Creates a rule without a description.
    #[must_use]
    pub fn new(id: impl Into<PatternId>, pattern: impl Into<String>, scope: PatternScope) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            scope,
            description: None,
        }
    }
}

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Outcome of checking one candidate text.
///
/// # Invariants
/// - `matched_rule_id` and `matched_scope` are `Some` exactly when
///   `allowed` is false.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardVerdict {
    /// True when no active rule matched.
    pub allowed: bool,
    /// Identifier of the first matching rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<PatternId>,
    /// Scope of the first matching rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_scope: Option<PatternScope>,
    /// Level the check was performed at.
    pub level_used: AssistanceLevel,
}

impl GuardVerdict {
    /// Builds an allowing verdict.
    pub const fn allow(level_used: AssistanceLevel) -> Self {
        Self {
            allowed: true,
            matched_rule_id: None,
            matched_scope: None,
            level_used,
        }
    }

    /// Builds a blocking verdict naming the matched rule.
    pub const fn block(rule_id: PatternId, scope: PatternScope, level_used: AssistanceLevel) -> Self {
        Self {
            allowed: false,
            matched_rule_id: Some(rule_id),
            matched_scope: Some(scope),
            level_used,
        }
    }

    /// Returns a one-line operator-facing explanation.
    #[must_use]
    pub fn reason(&self) -> String {
        match (&self.matched_rule_id, self.matched_scope) {
            (Some(rule_id), Some(scope)) => {
                format!("blocked by pattern '{rule_id}' (scope {scope}) at {}", self.level_used)
            }
            _ => format!("allowed at {}", self.level_used),
        }
    }
}

/// Outcome of checking every string field of a structured response.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredVerdict {
    /// Verdict for the first blocked field, or an allowing verdict.
    pub verdict: GuardVerdict,
    /// JSON path of the first blocked field (`$.steps[1].action`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Number of string fields examined.
    pub fields_checked: usize,
}

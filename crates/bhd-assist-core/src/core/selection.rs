// crates/bhd-assist-core/src/core/selection.rs
// ============================================================================
// Module: BHD Assist Playbook Selection Model
// Description: Declarative selection rules, conditions, and explain traces.
// Purpose: Describe how observations map to a recommended playbook.
// Dependencies: serde, serde_json, crate::core::{error, identifiers}
// ============================================================================

//! ## Overview
//! A [`SelectionRule`] names the test types it applies to, a conjunction of
//! [`SelectionCondition`]s over observation data, a priority, and the
//! playbook it recommends. Selection output always carries one
//! [`SelectionTrace`] per input rule so operators can see why a rule did or
//! did not fire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::ConfigurationError;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::TargetId;

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Comparison applied between an observation field and a condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Field equals the value (decimal-aware for numbers).
    Equals,
    /// Field is present and differs from the value.
    NotEquals,
    /// Field equals one of the values in an array.
    InSet,
    /// Field text contains the value (or any value of an array), ignoring case.
    Contains,
    /// Field is present.
    Exists,
    /// Numeric field is greater than the value.
    GreaterThan,
    /// Numeric field is greater than or equal to the value.
    GreaterThanOrEqual,
    /// Numeric field is less than the value.
    LessThan,
    /// Numeric field is less than or equal to the value.
    LessThanOrEqual,
}

impl Comparison {
    /// Returns the stable snake-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::InSet => "in_set",
            Self::Contains => "contains",
            Self::Exists => "exists",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
        }
    }

    /// Returns true for numeric ordering comparisons.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqual | Self::LessThan | Self::LessThanOrEqual
        )
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// Single predicate over observation data.
///
/// A condition is satisfied when at least one observation (optionally
/// restricted to `category`) has a field value satisfying the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionCondition {
    /// Observation data field to inspect.
    #[serde(alias = "observation_field")]
    pub field: String,
    /// Comparison to apply.
    pub comparison: Comparison,
    /// Comparison operand; absent only for [`Comparison::Exists`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Restricts candidate observations to one category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SelectionCondition {
    /// Creates an uncategorized condition.
    #[must_use]
    pub fn new(field: impl Into<String>, comparison: Comparison, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            comparison,
            value,
            category: None,
        }
    }

    /// Returns the condition restricted to `category`.
    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Validates operand shape against the comparison.
    fn validate(&self) -> Result<(), String> {
        if self.field.trim().is_empty() {
            return Err("condition field must be non-empty".to_string());
        }
        if self.category.as_deref().is_some_and(|category| category.trim().is_empty()) {
            return Err(format!("condition on '{}' has an empty category", self.field));
        }
        match (self.comparison, &self.value) {
            (Comparison::Exists, None) => Ok(()),
            (Comparison::Exists, Some(_)) => {
                Err(format!("condition on '{}': exists takes no value", self.field))
            }
            (comparison, None) => {
                Err(format!("condition on '{}': {comparison} requires a value", self.field))
            }
            (Comparison::InSet, Some(Value::Array(values))) if !values.is_empty() => Ok(()),
            (Comparison::InSet, Some(_)) => {
                Err(format!("condition on '{}': in_set requires a non-empty array", self.field))
            }
            (comparison, Some(Value::Number(_))) if comparison.is_ordering() => Ok(()),
            (comparison, Some(_)) if comparison.is_ordering() => {
                Err(format!("condition on '{}': {comparison} requires a number", self.field))
            }
            (_, Some(Value::Object(_))) => {
                Err(format!("condition on '{}': value must not be an object", self.field))
            }
            (_, Some(_)) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Declarative mapping from observations to a recommended playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionRule {
    /// Unique rule identifier.
    pub id: RuleId,
    /// Test types the rule applies to.
    pub test_types: BTreeSet<String>,
    /// Priority; the highest matching priority wins.
    pub priority: i64,
    /// Playbook recommended when the rule matches.
    pub target_id: TargetId,
    /// Conjunction of conditions; a rule with none never matches.
    #[serde(default)]
    pub conditions: Vec<SelectionCondition>,
    /// Optional operator-facing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SelectionRule {
    /// Validates the rule definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidEntry`] for empty identifiers,
    /// empty test type sets, empty condition lists, or malformed conditions.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidEntry {
            kind: "rule",
            id: self.id.to_string(),
            message,
        };
        if self.id.as_str().trim().is_empty() {
            return Err(invalid("id must be non-empty".to_string()));
        }
        if self.target_id.as_str().trim().is_empty() {
            return Err(invalid("target_id must be non-empty".to_string()));
        }
        if self.test_types.is_empty() {
            return Err(invalid("test_types must be non-empty".to_string()));
        }
        if self.test_types.iter().any(|test_type| test_type.trim().is_empty()) {
            return Err(invalid("test_types must not contain empty entries".to_string()));
        }
        if self.conditions.is_empty() {
            return Err(invalid("rule defines no conditions".to_string()));
        }
        for condition in &self.conditions {
            condition.validate().map_err(invalid)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Explain-mode record for one evaluated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTrace {
    /// Evaluated rule.
    pub rule_id: RuleId,
    /// Playbook the rule recommends.
    pub target_id: TargetId,
    /// Rule priority.
    pub priority: i64,
    /// True when every condition was satisfied.
    pub matched: bool,
    /// Unsatisfied conditions, empty when `matched`.
    pub failure_reasons: Vec<String>,
}

/// Outcome of playbook selection.
///
/// # Invariants
/// - `evaluated_rules` has one entry per input rule, in input order.
/// - `selected_target_id` is `Some` only if some trace has `matched`.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Recommended playbook, if any rule matched.
    pub selected_target_id: Option<TargetId>,
    /// Rule that produced the recommendation.
    pub selected_rule_id: Option<RuleId>,
    /// One trace per evaluated rule.
    pub evaluated_rules: Vec<SelectionTrace>,
}

impl SelectionResult {
    /// Returns the number of rules that matched.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.evaluated_rules.iter().filter(|trace| trace.matched).count()
    }
}

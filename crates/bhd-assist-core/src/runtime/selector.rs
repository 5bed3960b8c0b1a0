// crates/bhd-assist-core/src/runtime/selector.rs
// ============================================================================
// Module: BHD Assist Playbook Selector
// Description: Evaluates selection rules against observations with a full trace.
// Purpose: Recommend the highest-priority matching playbook and explain why.
// Dependencies: tracing, crate::core, crate::runtime::comparator
// ============================================================================

//! ## Overview
//! [`select`] evaluates every rule and returns one trace per rule in input
//! order. A condition is satisfied when at least one candidate observation
//! (restricted to the condition's category, if any) satisfies it, and a rule
//! matches when all of its conditions are satisfied. The winner is the
//! matching rule with the highest priority; ties go to the lexicographically
//! smallest rule id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use crate::core::ConfigurationError;
use crate::core::Observation;
use crate::core::SelectionCondition;
use crate::core::SelectionResult;
use crate::core::SelectionRule;
use crate::core::SelectionTrace;
use crate::runtime::comparator::Outcome;
use crate::runtime::comparator::compare;

// ============================================================================
// SECTION: Rule Set
// ============================================================================

/// Validated, immutable selection rule set.
///
/// # Invariants
/// - Rule ids are unique and every rule passed [`SelectionRule::validate`].
/// - Rules keep their document order, which is the trace order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRuleSet {
    /// Rule document version.
    version: String,
    /// Rules in document order.
    rules: Vec<SelectionRule>,
}

impl SelectionRuleSet {
    /// Validates a rule set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for a malformed version, duplicate ids,
    /// or any invalid rule.
    pub fn new(
        version: impl Into<String>,
        rules: Vec<SelectionRule>,
    ) -> Result<Self, ConfigurationError> {
        let version = version.into();
        crate::core::validate_version(&version)?;
        let mut seen = BTreeSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id.clone()) {
                return Err(ConfigurationError::DuplicateId {
                    kind: "rule",
                    id: rule.id.to_string(),
                });
            }
        }
        Ok(Self {
            version,
            rules,
        })
    }

    /// Returns the rule document version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the rules in document order.
    #[must_use]
    pub fn rules(&self) -> &[SelectionRule] {
        &self.rules
    }

    /// Selects a playbook for `test_type`. See [`select`].
    pub fn select(&self, test_type: &str, observations: &[Observation]) -> SelectionResult {
        select(test_type, observations, &self.rules)
    }
}

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Evaluates `rules` against `observations` for `test_type`.
///
/// # Invariants
/// - `evaluated_rules` has exactly one trace per input rule, in input order.
/// - Output depends only on the inputs (no clock, no randomness).
pub fn select(
    test_type: &str,
    observations: &[Observation],
    rules: &[SelectionRule],
) -> SelectionResult {
    let evaluated_rules: Vec<SelectionTrace> =
        rules.iter().map(|rule| evaluate_rule(test_type, observations, rule)).collect();
    let winner = rules
        .iter()
        .zip(&evaluated_rules)
        .filter(|(_, trace)| trace.matched)
        .map(|(rule, _)| rule)
        .max_by(|left, right| rank(left, right));
    debug!(
        test_type,
        rules = rules.len(),
        observations = observations.len(),
        selected = winner.map(|rule| rule.target_id.as_str()),
        "playbook selection evaluated"
    );
    SelectionResult {
        selected_target_id: winner.map(|rule| rule.target_id.clone()),
        selected_rule_id: winner.map(|rule| rule.id.clone()),
        evaluated_rules,
    }
}

/// Orders matching rules so that the preferred rule is the maximum.
fn rank(left: &SelectionRule, right: &SelectionRule) -> Ordering {
    left.priority.cmp(&right.priority).then_with(|| right.id.cmp(&left.id))
}

/// Evaluates one rule into its trace.
fn evaluate_rule(
    test_type: &str,
    observations: &[Observation],
    rule: &SelectionRule,
) -> SelectionTrace {
    let mut failure_reasons = Vec::new();
    if !rule.test_types.contains(test_type) {
        let listed: Vec<&str> = rule.test_types.iter().map(String::as_str).collect();
        failure_reasons.push(format!(
            "test_type '{test_type}' not in rule test_types [{}]",
            listed.join(", ")
        ));
    } else if rule.conditions.is_empty() {
        failure_reasons.push("rule defines no conditions".to_string());
    } else {
        failure_reasons.extend(
            rule.conditions
                .iter()
                .filter_map(|condition| evaluate_condition(condition, observations).err()),
        );
    }
    SelectionTrace {
        rule_id: rule.id.clone(),
        target_id: rule.target_id.clone(),
        priority: rule.priority,
        matched: failure_reasons.is_empty(),
        failure_reasons,
    }
}

/// Returns `Ok` when some candidate observation satisfies `condition`, or the
/// failure reason otherwise.
fn evaluate_condition(
    condition: &SelectionCondition,
    observations: &[Observation],
) -> Result<(), String> {
    let field = condition.field.as_str();
    let candidates: Vec<&Observation> = observations
        .iter()
        .filter(|observation| {
            condition.category.as_deref().is_none_or(|category| observation.category == category)
        })
        .collect();
    if let Some(category) = &condition.category
        && candidates.is_empty()
    {
        return Err(format!("no observation with category '{category}' (field '{field}')"));
    }
    let mut field_present = false;
    for observation in candidates {
        let actual = observation.field(field);
        field_present |= actual.is_some();
        if compare(condition.comparison, condition.value.as_ref(), actual) == Outcome::Satisfied {
            return Ok(());
        }
    }
    if !field_present {
        return Err(match &condition.category {
            Some(category) => {
                format!("field '{field}' not present on any observation with category '{category}'")
            }
            None => format!("field '{field}' not present on any observation"),
        });
    }
    Err(match &condition.value {
        Some(value) => format!("no observation satisfies {field} {} {value}", condition.comparison),
        None => format!("no observation satisfies {field} {}", condition.comparison),
    })
}

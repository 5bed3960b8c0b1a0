// crates/bhd-assist-core/src/runtime/comparator.rs
// ============================================================================
// Module: BHD Assist Field Comparator
// Description: Applies selection comparisons to observation field values.
// Purpose: Turn one field value and one condition into a three-way outcome.
// Dependencies: bigdecimal, serde_json, crate::core
// ============================================================================

//! ## Overview
//! Comparisons return [`Outcome::Indeterminate`] when the field is missing or
//! the operand types cannot be compared; the selector treats that as a
//! non-match. Numbers compare as decimals, so `22` equals `22.0`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Number;
use serde_json::Value;

use crate::core::Comparison;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Three-way comparison outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The comparison holds.
    Satisfied,
    /// The comparison was evaluated and does not hold.
    Unsatisfied,
    /// The comparison could not be evaluated (missing field or type mismatch).
    Indeterminate,
}

impl Outcome {
    /// Returns true only for [`Outcome::Satisfied`].
    #[must_use]
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value { Self::Satisfied } else { Self::Unsatisfied }
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Compares an observed field value against a condition operand.
#[must_use]
pub fn compare(comparison: Comparison, expected: Option<&Value>, actual: Option<&Value>) -> Outcome {
    let Some(actual) = actual else {
        return Outcome::Indeterminate;
    };
    if matches!(actual, Value::Array(_) | Value::Object(_)) {
        return Outcome::Indeterminate;
    }
    if comparison == Comparison::Exists {
        return Outcome::Satisfied;
    }
    let Some(expected) = expected else {
        return Outcome::Indeterminate;
    };
    match comparison {
        Comparison::Equals => scalar_equals(actual, expected),
        Comparison::NotEquals => match scalar_equals(actual, expected) {
            Outcome::Satisfied => Outcome::Unsatisfied,
            Outcome::Unsatisfied => Outcome::Satisfied,
            Outcome::Indeterminate => Outcome::Indeterminate,
        },
        Comparison::InSet => in_set(actual, expected),
        Comparison::Contains => contains(actual, expected),
        Comparison::GreaterThan
        | Comparison::GreaterThanOrEqual
        | Comparison::LessThan
        | Comparison::LessThanOrEqual => ordering(comparison, actual, expected),
        Comparison::Exists => Outcome::Satisfied,
    }
}

/// Scalar equality with decimal-aware numbers.
fn scalar_equals(actual: &Value, expected: &Value) -> Outcome {
    match (actual, expected) {
        (Value::Number(left), Value::Number(right)) => {
            decimal_cmp(left, right).map_or(Outcome::Indeterminate, |ord| ord.is_eq().into())
        }
        (_, Value::Array(_) | Value::Object(_)) => Outcome::Indeterminate,
        _ => Outcome::from(actual == expected),
    }
}

/// Membership of a scalar in an array operand.
fn in_set(actual: &Value, expected: &Value) -> Outcome {
    let Value::Array(candidates) = expected else {
        return Outcome::Indeterminate;
    };
    let found = candidates
        .iter()
        .any(|candidate| scalar_equals(actual, candidate).is_satisfied());
    Outcome::from(found)
}

/// Case-insensitive substring match over the rendered scalar.
///
/// An array operand matches when any of its strings is contained.
fn contains(actual: &Value, expected: &Value) -> Outcome {
    let haystack = render_scalar(actual).to_lowercase();
    let needles: Vec<&str> = match expected {
        Value::String(needle) => vec![needle.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return Outcome::Indeterminate,
    };
    if needles.is_empty() {
        return Outcome::Indeterminate;
    }
    Outcome::from(needles.iter().any(|needle| haystack.contains(&needle.to_lowercase())))
}

/// Decimal-aware numeric ordering.
fn ordering(comparison: Comparison, actual: &Value, expected: &Value) -> Outcome {
    let (Some(left), Some(right)) = (actual.as_number(), expected.as_number()) else {
        return Outcome::Indeterminate;
    };
    let Some(ord) = decimal_cmp(left, right) else {
        return Outcome::Indeterminate;
    };
    match comparison {
        Comparison::GreaterThan => ord.is_gt().into(),
        Comparison::GreaterThanOrEqual => ord.is_ge().into(),
        Comparison::LessThan => ord.is_lt().into(),
        Comparison::LessThanOrEqual => ord.is_le().into(),
        _ => Outcome::Indeterminate,
    }
}

/// Renders a scalar for substring matching.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Orders two JSON numbers as decimals.
fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = BigDecimal::from_str(&left.to_string()).ok()?;
    let right = BigDecimal::from_str(&right.to_string()).ok()?;
    Some(left.cmp(&right))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Outcome;
    use super::compare;
    use crate::core::Comparison;

    #[test]
    fn numbers_compare_as_decimals() {
        assert_eq!(
            compare(Comparison::Equals, Some(&json!(22)), Some(&json!(22.0))),
            Outcome::Satisfied
        );
        assert_eq!(
            compare(Comparison::GreaterThan, Some(&json!(1024)), Some(&json!(8080))),
            Outcome::Satisfied
        );
        assert_eq!(
            compare(Comparison::LessThanOrEqual, Some(&json!(0.5)), Some(&json!("0.4"))),
            Outcome::Indeterminate
        );
    }

    #[test]
    fn string_equality_is_exact_and_contains_ignores_case() {
        assert_eq!(
            compare(Comparison::Equals, Some(&json!("SSH")), Some(&json!("ssh"))),
            Outcome::Unsatisfied
        );
        assert_eq!(
            compare(Comparison::Contains, Some(&json!("admin")), Some(&json!("/Admin/login"))),
            Outcome::Satisfied
        );
        assert_eq!(
            compare(Comparison::Contains, Some(&json!(["api", "admin"])), Some(&json!("/API/v1"))),
            Outcome::Satisfied
        );
    }

    #[test]
    fn missing_field_is_indeterminate_even_for_not_equals() {
        assert_eq!(compare(Comparison::NotEquals, Some(&json!(1)), None), Outcome::Indeterminate);
        assert_eq!(compare(Comparison::Exists, None, None), Outcome::Indeterminate);
        assert_eq!(compare(Comparison::Exists, None, Some(&json!(false))), Outcome::Satisfied);
    }

    #[test]
    fn in_set_uses_scalar_equality() {
        assert_eq!(
            compare(Comparison::InSet, Some(&json!([502, 20000])), Some(&json!(502.0))),
            Outcome::Satisfied
        );
        assert_eq!(
            compare(Comparison::InSet, Some(&json!(["rdp"])), Some(&json!("ssh"))),
            Outcome::Unsatisfied
        );
    }
}

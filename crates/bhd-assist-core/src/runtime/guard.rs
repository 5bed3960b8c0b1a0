// crates/bhd-assist-core/src/runtime/guard.rs
// ============================================================================
// Module: BHD Assist Content Guard
// Description: Checks candidate text against the active disallowed patterns.
// Purpose: Block disallowed guidance before it reaches an operator.
// Dependencies: serde_json, crate::core, crate::runtime::catalog
// ============================================================================

//! ## Overview
//! The guard is a pure function of `(text, level, catalog)`. Patterns are
//! scanned in ascending id order and the first match wins. Structured
//! responses are checked field by field in sorted-key, array-index order so
//! that the reported field is deterministic. Object keys are checked too,
//! each before its value, and reported as `<path>#key`.
//!
//! Security posture: candidate text is untrusted and never logged by this
//! module.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::core::AssistanceLevel;
use crate::core::GuardVerdict;
use crate::core::StructuredVerdict;
use crate::runtime::catalog::PatternCatalog;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Checks `text` against the patterns active at `level`.
///
/// # Invariants
/// - Blocks whenever an `always` pattern matches, at every level.
/// - Repeated calls with the same inputs return the same verdict.
pub fn evaluate(catalog: &PatternCatalog, text: &str, level: AssistanceLevel) -> GuardVerdict {
    catalog
        .active_patterns(level)
        .find(|pattern| pattern.is_match(text))
        .map_or_else(
            || GuardVerdict::allow(level),
            |pattern| GuardVerdict::block(pattern.rule().id.clone(), pattern.rule().scope, level),
        )
}

/// Checks every object key and string leaf of `value`, stopping at the first
/// blocked field.
pub fn evaluate_structured(
    catalog: &PatternCatalog,
    value: &Value,
    level: AssistanceLevel,
) -> StructuredVerdict {
    let mut leaves = Vec::new();
    collect_string_leaves(value, "$".to_string(), &mut leaves);
    let mut fields_checked = 0;
    for (path, text) in leaves {
        fields_checked += 1;
        let verdict = evaluate(catalog, text, level);
        if !verdict.allowed {
            return StructuredVerdict {
                verdict,
                field: Some(path),
                fields_checked,
            };
        }
    }
    StructuredVerdict {
        verdict: GuardVerdict::allow(level),
        field: None,
        fields_checked,
    }
}

/// Collects `(json_path, text)` for every object key and string leaf in
/// deterministic order.
fn collect_string_leaves<'a>(value: &'a Value, path: String, out: &mut Vec<(String, &'a str)>) {
    match value {
        Value::String(text) => out.push((path, text.as_str())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_string_leaves(item, format!("{path}[{index}]"), out);
            }
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                if let Some(child) = map.get(key) {
                    let child_path = format!("{path}.{key}");
                    out.push((format!("{child_path}#key"), key.as_str()));
                    collect_string_leaves(child, child_path, out);
                }
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

// ============================================================================
// SECTION: Guard Handle
// ============================================================================

/// Shareable guard bound to one catalog.
#[derive(Debug, Clone)]
pub struct ContentGuard {
    /// Shared read-only catalog.
    catalog: Arc<PatternCatalog>,
}

impl ContentGuard {
    /// Creates a guard over `catalog`.
    #[must_use]
    pub const fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self {
            catalog,
        }
    }

    /// Returns the underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Checks `text` at `level`. See [`evaluate`].
    pub fn evaluate(&self, text: &str, level: AssistanceLevel) -> GuardVerdict {
        evaluate(&self.catalog, text, level)
    }

    /// Checks a structured response at `level`. See [`evaluate_structured`].
    pub fn evaluate_structured(&self, value: &Value, level: AssistanceLevel) -> StructuredVerdict {
        evaluate_structured(&self.catalog, value, level)
    }
}

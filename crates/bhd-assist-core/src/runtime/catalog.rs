// crates/bhd-assist-core/src/runtime/catalog.rs
// ============================================================================
// Module: BHD Assist Pattern Catalog
// Description: Compiled, immutable set of disallowed-content patterns.
// Purpose: Validate pattern rules once and serve per-level active sets.
// Dependencies: regex, tracing, crate::core
// ============================================================================

//! ## Overview
//! [`PatternCatalog::new`] validates and compiles every rule up front: an
//! invalid regex, a duplicate id, or an empty field aborts construction. The
//! compiled catalog is read-only and is shared by reference across threads.
//! Rules are stored in ascending id order, which is the guard's scan order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use regex::Regex;
use regex::RegexBuilder;
use tracing::debug;

use crate::core::AssistanceLevel;
use crate::core::ConfigurationError;
use crate::core::PatternRule;
use crate::core::PatternScope;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Upper bound on compiled regex size per pattern.
const MAX_COMPILED_PATTERN_BYTES: usize = 1 << 20;

// ============================================================================
// SECTION: Compiled Pattern
// ============================================================================

/// A validated rule with its compiled case-insensitive regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Source rule.
    rule: PatternRule,
    /// Compiled matcher.
    regex: Regex,
}

impl CompiledPattern {
    /// Returns the source rule.
    #[must_use]
    pub const fn rule(&self) -> &PatternRule {
        &self.rule
    }

    /// Returns true when the pattern matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Immutable catalog of compiled disallowed-content patterns.
///
/// # Invariants
/// - Pattern ids are unique and patterns are sorted by id.
/// - No pattern is scoped to [`AssistanceLevel::Reserved`].
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    /// Catalog document version.
    version: String,
    /// Compiled patterns in ascending id order.
    patterns: Vec<CompiledPattern>,
}

impl PatternCatalog {
    /// Validates and compiles pattern rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for empty fields, duplicate ids,
    /// reserved-level scopes, or patterns that fail to compile.
    pub fn new(
        version: impl Into<String>,
        rules: Vec<PatternRule>,
    ) -> Result<Self, ConfigurationError> {
        let version = version.into();
        crate::core::validate_version(&version)?;
        let mut seen = BTreeSet::new();
        let mut patterns = Vec::with_capacity(rules.len());
        for rule in rules {
            validate_rule(&rule)?;
            if !seen.insert(rule.id.clone()) {
                return Err(ConfigurationError::DuplicateId {
                    kind: "pattern",
                    id: rule.id.to_string(),
                });
            }
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .size_limit(MAX_COMPILED_PATTERN_BYTES)
                .build()
                .map_err(|err| ConfigurationError::InvalidPattern {
                    id: rule.id.to_string(),
                    message: err.to_string(),
                })?;
            patterns.push(CompiledPattern {
                rule,
                regex,
            });
        }
        patterns.sort_by(|left, right| left.rule.id.cmp(&right.rule.id));
        debug!(version = %version, patterns = patterns.len(), "pattern catalog compiled");
        Ok(Self {
            version,
            patterns,
        })
    }

    /// Returns the catalog document version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns every compiled pattern in ascending id order.
    #[must_use]
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true when the catalog holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the patterns active at `level`: the always set plus rules
    /// scoped to exactly that level, in ascending id order.
    pub fn active_patterns(
        &self,
        level: AssistanceLevel,
    ) -> impl Iterator<Item = &CompiledPattern> + '_ {
        self.patterns.iter().filter(move |pattern| pattern.rule.scope.applies_to(level))
    }
}

/// Validates the declarative fields of one rule.
fn validate_rule(rule: &PatternRule) -> Result<(), ConfigurationError> {
    let invalid = |message: &str| ConfigurationError::InvalidEntry {
        kind: "pattern",
        id: rule.id.to_string(),
        message: message.to_string(),
    };
    if rule.id.as_str().trim().is_empty() {
        return Err(invalid("id must be non-empty"));
    }
    if rule.pattern.trim().is_empty() {
        return Err(invalid("pattern must be non-empty"));
    }
    if rule.scope == PatternScope::Level(AssistanceLevel::Reserved) {
        return Err(ConfigurationError::ReservedLevel);
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::PatternCatalog;
    use crate::core::AssistanceLevel;
    use crate::core::ConfigurationError;
    use crate::core::PatternRule;
    use crate::core::PatternScope;

    #[test]
    fn active_set_contains_always_plus_own_level() -> Result<(), String> {
        let catalog = PatternCatalog::new(
            "1.0.0",
            vec![
                PatternRule::new("b-lab", "lab", PatternScope::Level(AssistanceLevel::LabTraining)),
                PatternRule::new("a-always", "always", PatternScope::Always),
                PatternRule::new(
                    "c-val",
                    "val",
                    PatternScope::Level(AssistanceLevel::ValidationOnly),
                ),
            ],
        )
        .map_err(|err| err.to_string())?;
        let ids = |level| {
            catalog
                .active_patterns(level)
                .map(|pattern| pattern.rule().id.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(AssistanceLevel::ValidationOnly), vec!["a-always", "c-val"]);
        assert_eq!(ids(AssistanceLevel::LabTraining), vec!["a-always", "b-lab"]);
        Ok(())
    }

    #[test]
    fn reserved_scope_is_rejected() {
        let result = PatternCatalog::new(
            "1.0.0",
            vec![PatternRule::new("r", "x", PatternScope::Level(AssistanceLevel::Reserved))],
        );
        assert!(matches!(result, Err(ConfigurationError::ReservedLevel)));
    }
}

// crates/bhd-assist-config/src/documents.rs
// ============================================================================
// Module: Policy Documents
// Description: Pattern catalog and selection rule documents.
// Purpose: Parse declarative policy files into validated core structures.
// Dependencies: bhd-assist-core, serde, serde_yaml, toml
// ============================================================================

//! ## Overview
//! Two declarative documents drive the policy core: the pattern catalog
//! (TOML) consumed by the content guard, and the selection rules (YAML or
//! TOML) consumed by the playbook selector. Both carry a semantic version and
//! are validated in full before any structure is handed to the core, so a
//! single bad entry rejects the whole document.
//!
//! Bundled defaults ship inside this crate and pass the same validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use bhd_assist_core::PatternCatalog;
use bhd_assist_core::PatternRule;
use bhd_assist_core::SelectionRule;
use bhd_assist_core::SelectionRuleSet;
use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;
use crate::config::read_bounded;

// ============================================================================
// SECTION: Bundled Documents
// ============================================================================

/// Bundled pattern catalog source.
pub const DEFAULT_PATTERN_CATALOG: &str = include_str!("../data/patterns.toml");
/// Bundled selection rules source.
pub const DEFAULT_SELECTION_RULES: &str = include_str!("../data/selector_rules.yaml");

/// Compiles the bundled pattern catalog.
///
/// # Errors
///
/// Returns [`ConfigError`] if the bundled document is invalid.
pub fn default_catalog() -> Result<PatternCatalog, ConfigError> {
    PatternCatalogDocument::from_toml_str(DEFAULT_PATTERN_CATALOG)?.compile()
}

/// Builds the bundled selection rule set.
///
/// # Errors
///
/// Returns [`ConfigError`] if the bundled document is invalid.
pub fn default_rules() -> Result<SelectionRuleSet, ConfigError> {
    SelectionRuleDocument::from_yaml_str(DEFAULT_SELECTION_RULES)?.build()
}

// ============================================================================
// SECTION: Pattern Catalog
// ============================================================================

/// Pattern catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternCatalogDocument {
    /// Semantic version of the catalog.
    pub version: String,
    /// Pattern rules in document order.
    #[serde(default)]
    pub patterns: Vec<PatternRule>,
}

impl PatternCatalogDocument {
    /// Reads a catalog document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_bounded(path, "pattern catalog")?;
        Self::from_toml_str(&content)
    }

    /// Parses catalog TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text does not match the shape.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|err| ConfigError::Parse(format!("pattern catalog: {err}")))
    }

    /// Compiles the document into a [`PatternCatalog`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any entry fails validation.
    pub fn compile(self) -> Result<PatternCatalog, ConfigError> {
        PatternCatalog::new(self.version, self.patterns)
            .map_err(|err| ConfigError::Invalid(format!("pattern catalog: {err}")))
    }
}

// ============================================================================
// SECTION: Selection Rules
// ============================================================================

/// Selection rule document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionRuleDocument {
    /// Semantic version of the rule set.
    pub version: String,
    /// Rules in document order.
    #[serde(default)]
    pub rules: Vec<SelectionRule>,
}

impl SelectionRuleDocument {
    /// Reads a rule document; `.toml` files parse as TOML, `.yaml`/`.yml` as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or the
    /// extension is not recognized.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let content = read_bounded(path, "selection rules")?;
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            other => Err(ConfigError::Invalid(format!(
                "selection rules: unsupported file extension '{other}' (expected yaml, yml, or \
                 toml)"
            ))),
        }
    }

    /// Parses rule YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text does not match the shape.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|err| ConfigError::Parse(format!("selection rules: {err}")))
    }

    /// Parses rule TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text does not match the shape.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|err| ConfigError::Parse(format!("selection rules: {err}")))
    }

    /// Validates the document into a [`SelectionRuleSet`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any rule fails validation.
    pub fn build(self) -> Result<SelectionRuleSet, ConfigError> {
        SelectionRuleSet::new(self.version, self.rules)
            .map_err(|err| ConfigError::Invalid(format!("selection rules: {err}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/bhd-assist-config/src/config.rs
// ============================================================================
// Module: BHD Assist Configuration
// Description: Loading and validation for `bhd-assist.toml`.
// Purpose: Fail-closed config parsing with hard path and size limits.
// Dependencies: bhd-assist-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! An explicitly named file must exist; when the default file is absent the
//! built-in defaults apply. Relative paths inside the file are resolved
//! against the directory holding it.
//!
//! Security posture: config inputs are untrusted and fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use bhd_assist_core::AuditLogOptions;
use bhd_assist_core::PatternCatalog;
use bhd_assist_core::Redactor;
use bhd_assist_core::SelectionRuleSet;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::documents;
use crate::documents::PatternCatalogDocument;
use crate::documents::SelectionRuleDocument;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "bhd-assist.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BHD_ASSIST_CONFIG";
/// Maximum size in bytes of any file read by this crate.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of extra redaction keys.
pub(crate) const MAX_REDACT_KEYS: usize = 64;
/// Default decision log location.
const DEFAULT_AUDIT_PATH: &str = "decision_log.jsonl";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The file is not valid TOML/YAML or does not match the document shape.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The file parsed but violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root of `bhd-assist.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistConfig {
    /// Decision audit log settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Content guard settings.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Playbook selector settings.
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// `[audit]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Append-only JSONL decision log.
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
    /// Adds `prev_hash`/`hash` to every record.
    #[serde(default = "default_hash_chain")]
    pub hash_chain: bool,
    /// Extra detail keys that are always redacted.
    #[serde(default)]
    pub redact_keys: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: default_audit_path(),
            hash_chain: default_hash_chain(),
            redact_keys: Vec::new(),
        }
    }
}

/// `[policy]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Pattern catalog document; the bundled catalog is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

/// `[selector]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorConfig {
    /// Selection rule document; the bundled rules are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,
}

/// Serde default for [`AuditConfig::path`].
fn default_audit_path() -> PathBuf {
    PathBuf::from(DEFAULT_AUDIT_PATH)
}

/// Serde default for [`AuditConfig::hash_chain`].
const fn default_hash_chain() -> bool {
    true
}

impl AssistConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// Resolution order: `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`] in the working directory. Only the default
    /// file may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let content = read_bounded(&resolved, "config")?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = resolved.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("audit.path", &self.audit.path.to_string_lossy())?;
        if self.audit.redact_keys.len() > MAX_REDACT_KEYS {
            return Err(ConfigError::Invalid(format!(
                "audit.redact_keys exceeds {MAX_REDACT_KEYS} entries"
            )));
        }
        for (index, key) in self.audit.redact_keys.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "audit.redact_keys[{index}] must be non-empty"
                )));
            }
        }
        if let Some(catalog) = &self.policy.catalog {
            validate_path_string("policy.catalog", &catalog.to_string_lossy())?;
        }
        if let Some(rules) = &self.selector.rules {
            validate_path_string("selector.rules", &rules.to_string_lossy())?;
        }
        Ok(())
    }

    /// Returns the decision log path, resolved against the config directory.
    #[must_use]
    pub fn audit_log_path(&self) -> PathBuf {
        self.resolve_relative(&self.audit.path)
    }

    /// Returns the writer options for the decision log.
    #[must_use]
    pub const fn audit_log_options(&self) -> AuditLogOptions {
        AuditLogOptions {
            hash_chain: self.audit.hash_chain,
        }
    }

    /// Returns the redactor with the default keys plus configured keys.
    #[must_use]
    pub fn redactor(&self) -> Redactor {
        Redactor::with_extra_keys(&self.audit.redact_keys)
    }

    /// Loads and compiles the configured pattern catalog, or the bundled one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document cannot be read or compiled.
    pub fn pattern_catalog(&self) -> Result<PatternCatalog, ConfigError> {
        match &self.policy.catalog {
            Some(path) => PatternCatalogDocument::load(&self.resolve_relative(path))?.compile(),
            None => documents::default_catalog(),
        }
    }

    /// Loads and validates the configured selection rules, or the bundled ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document cannot be read or validated.
    pub fn selection_rules(&self) -> Result<SelectionRuleSet, ConfigError> {
        match &self.selector.rules {
            Some(path) => SelectionRuleDocument::load(&self.resolve_relative(path))?.build(),
            None => documents::default_rules(),
        }
    }

    /// Joins relative paths onto the config file's directory.
    fn resolve_relative(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() && !base.as_os_str().is_empty() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is false only for the default name.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates a path against length limits.
pub(crate) fn validate_path(label: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{label} path exceeds max length")));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{label} path component too long")));
        }
    }
    Ok(())
}

/// Validates a configured path string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_path(field, Path::new(trimmed))
}

/// Reads a UTF-8 file after applying the path and size limits.
pub(crate) fn read_bounded(path: &Path, label: &str) -> Result<String, ConfigError> {
    validate_path(label, path)?;
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid(format!("{label} file exceeds size limit")));
    }
    String::from_utf8(bytes)
        .map_err(|_| ConfigError::Invalid(format!("{label} file must be utf-8")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

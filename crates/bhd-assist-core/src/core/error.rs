// crates/bhd-assist-core/src/core/error.rs
// ============================================================================
// Module: BHD Assist Configuration Errors
// Description: Load-time validation failures for catalogs, rules, and levels.
// Purpose: Surface malformed declarative inputs before any evaluation runs.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ConfigurationError`] covers every failure that must abort startup or an
//! enclosing operation: malformed pattern or rule definitions, and requests for
//! the unimplemented RESERVED assistance level. These errors are never
//! recovered by silently skipping the offending entry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors raised while building static policy state.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages name the offending entry so they can be shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A catalog or rule entry failed validation.
    #[error("{kind} '{id}': {message}")]
    InvalidEntry {
        /// Entry kind (`pattern`, `rule`, `condition`).
        kind: &'static str,
        /// Entry identifier (may be empty when the id itself is missing).
        id: String,
        /// Validation failure detail.
        message: String,
    },
    /// Two entries of the same kind share an identifier.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Entry kind (`pattern`, `rule`).
        kind: &'static str,
        /// Duplicated identifier.
        id: String,
    },
    /// A pattern failed to compile as a regular expression.
    #[error("pattern '{id}' is not a valid regular expression: {message}")]
    InvalidPattern {
        /// Pattern identifier.
        id: String,
        /// Compiler error detail.
        message: String,
    },
    /// A pattern scope string was not recognized.
    #[error("unknown pattern scope '{0}' (expected always, level:validation_only, level:lab_training)")]
    UnknownScope(String),
    /// An assistance level string was not recognized.
    #[error("unknown assistance level '{0}'")]
    UnknownLevel(String),
    /// The RESERVED assistance level was requested or referenced.
    #[error("assistance level RESERVED is not implemented")]
    ReservedLevel,
    /// A document version string was malformed.
    #[error("invalid version '{0}' (expected MAJOR.MINOR.PATCH)")]
    InvalidVersion(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a `MAJOR.MINOR.PATCH` version string.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidVersion`] when the string has a
/// different shape or a non-numeric component.
pub fn validate_version(version: &str) -> Result<(), ConfigurationError> {
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = parts.len() == 3
        && parts.iter().all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if well_formed {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidVersion(version.to_string()))
    }
}

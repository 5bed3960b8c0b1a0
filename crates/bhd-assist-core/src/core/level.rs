// crates/bhd-assist-core/src/core/level.rs
// ============================================================================
// Module: BHD Assist Assistance Levels
// Description: Ordered assistance levels controlling guidance intensity.
// Purpose: Provide the closed set of levels the policy core can operate at.
// Dependencies: serde, crate::core::error
// ============================================================================

//! ## Overview
//! Assistance levels are ordered by the amount of guidance they permit.
//! `ValidationOnly` is the universal default and is never implicitly upgraded.
//! `Reserved` exists only so that requests for it can be recognized and
//! rejected; nothing in this crate ever produces it as an effective level.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ConfigurationError;

// ============================================================================
// SECTION: Assistance Level
// ============================================================================

/// Maximum guidance intensity the system will produce for a request.
///
/// # Invariants
/// - Ordering follows the ordinal: `ValidationOnly < LabTraining < Reserved`.
/// - `Reserved` is unimplemented and must fail closed wherever it is requested.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssistanceLevel {
    /// Validation and evidence guidance only (level 0).
    #[default]
    ValidationOnly,
    /// Broader guidance for owned lab and training targets (level 1).
    LabTraining,
    /// Unimplemented level 2.
    Reserved,
}

impl AssistanceLevel {
    /// Returns the numeric ordinal of the level.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::ValidationOnly => 0,
            Self::LabTraining => 1,
            Self::Reserved => 2,
        }
    }

    /// Returns the stable snake-case label used in configuration documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationOnly => "validation_only",
            Self::LabTraining => "lab_training",
            Self::Reserved => "reserved",
        }
    }

    /// Returns the operating-mode label (`standard` / `deep_lab`) for the level.
    #[must_use]
    pub const fn mode_label(self) -> &'static str {
        match self {
            Self::ValidationOnly => "standard",
            Self::LabTraining => "deep_lab",
            Self::Reserved => "reserved",
        }
    }

    /// Returns true when the level grants a concrete set of allowances.
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        !matches!(self, Self::Reserved)
    }

    /// Returns the level for an implemented ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ReservedLevel`] for ordinal 2 and
    /// [`ConfigurationError::UnknownLevel`] for anything larger.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(Self::ValidationOnly),
            1 => Ok(Self::LabTraining),
            2 => Err(ConfigurationError::ReservedLevel),
            other => Err(ConfigurationError::UnknownLevel(other.to_string())),
        }
    }
}

impl fmt::Display for AssistanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ValidationOnly => "VALIDATION_ONLY",
            Self::LabTraining => "LAB_TRAINING",
            Self::Reserved => "RESERVED",
        };
        f.write_str(label)
    }
}

impl FromStr for AssistanceLevel {
    type Err = ConfigurationError;

    /// Parses an implemented level; the reserved level is rejected.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "validation_only" | "0" | "standard" => Ok(Self::ValidationOnly),
            "lab_training" | "1" | "deep_lab" => Ok(Self::LabTraining),
            "reserved" | "2" | "level_2" => Err(ConfigurationError::ReservedLevel),
            _ => Err(ConfigurationError::UnknownLevel(value.to_string())),
        }
    }
}

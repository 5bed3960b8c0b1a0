// crates/bhd-assist-core/src/core/context.rs
// ============================================================================
// Module: BHD Assist Request Context
// Description: Environment, authorization, and ownership facts for a request.
// Purpose: Normalize caller-supplied context into closed, fail-closed enums.
// Dependencies: serde, crate::core::{error, level}
// ============================================================================

//! ## Overview
//! An [`AssistanceContext`] captures the facts the level resolver consults.
//! Every enum keeps an `Unrecognized` arm carrying the raw input: unknown
//! values are preserved for audit but are never treated as satisfying a
//! requirement.
//!
//! Security posture: context values are caller-controlled and untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ConfigurationError;
use crate::core::level::AssistanceLevel;

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Deployment environment the request targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    /// Production client engagement.
    ProdClient,
    /// Owned lab environment.
    Lab,
    /// Capture-the-flag exercise.
    Ctf,
    /// Any other value; never satisfies a requirement.
    Unrecognized(String),
}

impl Environment {
    /// Normalizes a raw environment string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod_client" => Self::ProdClient,
            "lab" => Self::Lab,
            "ctf" => Self::Ctf,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Returns the canonical label, or the raw text for unrecognized values.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ProdClient => "prod_client",
            Self::Lab => "lab",
            Self::Ctf => "ctf",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Returns true for environments where deep lab guidance may apply.
    #[must_use]
    pub const fn is_training_ground(&self) -> bool {
        matches!(self, Self::Lab | Self::Ctf)
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Target Owner
// ============================================================================

/// Owner of the system under test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetOwner {
    /// Owned by the operator (`self`).
    SelfOwned,
    /// Owned by a client.
    Client,
    /// Ownership explicitly unknown.
    Unknown,
    /// Any other value; never satisfies a requirement.
    Unrecognized(String),
}

impl TargetOwner {
    /// Normalizes a raw target owner string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "self" => Self::SelfOwned,
            "client" => Self::Client,
            "unknown" => Self::Unknown,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Returns the canonical label, or the raw text for unrecognized values.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SelfOwned => "self",
            Self::Client => "client",
            Self::Unknown => "unknown",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for TargetOwner {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TargetOwner> for String {
    fn from(value: TargetOwner) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TargetOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Requested Level
// ============================================================================

/// Operating mode requested by the caller.
///
/// # Invariants
/// - A request for the reserved level never produces a value of this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestedLevel {
    /// Standard mode (validation only).
    Standard,
    /// Deep lab mode (lab training when permitted).
    DeepLab,
    /// Any other value; resolved as [`RequestedLevel::Standard`].
    Unrecognized(String),
}

impl RequestedLevel {
    /// Normalizes a raw requested level string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ReservedLevel`] when the reserved level
    /// is requested by name or ordinal.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "standard" | "validation_only" | "0" => Ok(Self::Standard),
            "deep_lab" | "lab_training" | "1" => Ok(Self::DeepLab),
            "reserved" | "level_2" | "2" => Err(ConfigurationError::ReservedLevel),
            _ => Ok(Self::Unrecognized(raw.to_string())),
        }
    }

    /// Returns the canonical label, or the raw text for unrecognized values.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "standard",
            Self::DeepLab => "deep_lab",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Returns the assistance level this request asks for before clamping.
    #[must_use]
    pub const fn target_level(&self) -> AssistanceLevel {
        match self {
            Self::DeepLab => AssistanceLevel::LabTraining,
            Self::Standard | Self::Unrecognized(_) => AssistanceLevel::ValidationOnly,
        }
    }
}

impl TryFrom<String> for RequestedLevel {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RequestedLevel> for String {
    fn from(value: RequestedLevel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RequestedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Normalized request context consulted by the level resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistanceContext {
    /// Deployment environment.
    pub environment: Environment,
    /// Whether the operator holds explicit authorization for the target.
    pub authorized: bool,
    /// Owner of the target system.
    pub target_owner: TargetOwner,
    /// Requested operating mode.
    pub requested_level: RequestedLevel,
}

impl AssistanceContext {
    /// Builds a context from already-normalized values.
    #[must_use]
    pub const fn new(
        environment: Environment,
        authorized: bool,
        target_owner: TargetOwner,
        requested_level: RequestedLevel,
    ) -> Self {
        Self {
            environment,
            authorized,
            target_owner,
            requested_level,
        }
    }
}

/// Raw, caller-supplied request context prior to normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistanceRequest {
    /// Raw environment label.
    pub environment: String,
    /// Authorization flag.
    #[serde(default)]
    pub authorized: bool,
    /// Raw target owner label.
    #[serde(default = "default_target_owner")]
    pub target_owner: String,
    /// Raw requested level label.
    #[serde(default = "default_requested_level")]
    pub requested_level: String,
}

impl AssistanceRequest {
    /// Normalizes the request into an [`AssistanceContext`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ReservedLevel`] when the reserved level
    /// is requested.
    pub fn normalize(&self) -> Result<AssistanceContext, ConfigurationError> {
        Ok(AssistanceContext::new(
            Environment::parse(&self.environment),
            self.authorized,
            TargetOwner::parse(&self.target_owner),
            RequestedLevel::parse(&self.requested_level)?,
        ))
    }
}

/// Default target owner for requests that omit it.
fn default_target_owner() -> String {
    "unknown".to_string()
}

/// Default requested level for requests that omit it.
fn default_requested_level() -> String {
    "standard".to_string()
}

// ============================================================================
// SECTION: Resolution Outcome
// ============================================================================

/// Outcome of resolving an [`AssistanceContext`] to an effective level.
///
/// # Invariants
/// - `effective_level` is never [`AssistanceLevel::Reserved`].
/// - `reasons` is never empty.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResolution {
    /// Level the request will be served at.
    pub effective_level: AssistanceLevel,
    /// Human-readable explanation of the decision, in evaluation order.
    pub reasons: Vec<String>,
    /// True when the requested level was lowered by an unmet requirement.
    pub clamped: bool,
}

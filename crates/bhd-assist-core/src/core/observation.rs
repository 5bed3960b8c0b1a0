// crates/bhd-assist-core/src/core/observation.rs
// ============================================================================
// Module: BHD Assist Observations
// Description: Normalized facts extracted from engagement artifacts.
// Purpose: Provide the read-only input the playbook selector matches against.
// Dependencies: serde, serde_json, thiserror, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Observations are produced upstream from scan output and are read-only
//! here. `data` is a flat map of scalar fields keyed by name; the selector
//! never mutates it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ObservationId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Observation validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    /// A required text field is empty.
    #[error("observation '{id}': {field} must be non-empty")]
    EmptyField {
        /// Observation identifier.
        id: String,
        /// Name of the empty field.
        field: &'static str,
    },
    /// Confidence is outside `[0.0, 1.0]`.
    #[error("observation '{id}': confidence must be within 0.0..=1.0")]
    InvalidConfidence {
        /// Observation identifier.
        id: String,
    },
    /// A data field holds an array or object.
    #[error("observation '{id}': data field '{field}' must be a scalar")]
    NonScalarField {
        /// Observation identifier.
        id: String,
        /// Offending field name.
        field: String,
    },
}

// ============================================================================
// SECTION: Observation
// ============================================================================

/// A single normalized fact about a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    /// Observation identifier.
    pub id: ObservationId,
    /// Category label (`service`, `authorization`, ...).
    pub category: String,
    /// Test type the observation belongs to (`web`, `network`, ...).
    pub test_type: String,
    /// Scalar fields keyed by name.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    /// Artifact the observation was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_artifact: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Extraction confidence in `[0.0, 1.0]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Observation {
    /// Creates an observation with no data fields.
    #[must_use]
    pub fn new(
        id: impl Into<ObservationId>,
        category: impl Into<String>,
        test_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            test_type: test_type.into(),
            data: BTreeMap::new(),
            source_artifact: None,
            tags: Vec::new(),
            confidence: None,
        }
    }

    /// Returns the observation with an additional data field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Returns the value of a data field, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Validates structural constraints on the observation.
    ///
    /// # Errors
    ///
    /// Returns [`ObservationError`] for empty identifiers or labels,
    /// out-of-range confidence, or non-scalar data fields.
    pub fn validate(&self) -> Result<(), ObservationError> {
        let id = self.id.as_str();
        for (field, value) in
            [("id", id), ("category", self.category.as_str()), ("test_type", self.test_type.as_str())]
        {
            if value.trim().is_empty() {
                return Err(ObservationError::EmptyField {
                    id: id.to_string(),
                    field,
                });
            }
        }
        if let Some(confidence) = self.confidence
            && !(0.0..=1.0).contains(&confidence)
        {
            return Err(ObservationError::InvalidConfidence {
                id: id.to_string(),
            });
        }
        if let Some((field, _)) =
            self.data.iter().find(|(_, value)| matches!(value, Value::Array(_) | Value::Object(_)))
        {
            return Err(ObservationError::NonScalarField {
                id: id.to_string(),
                field: field.clone(),
            });
        }
        Ok(())
    }
}

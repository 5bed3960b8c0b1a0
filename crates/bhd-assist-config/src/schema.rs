// crates/bhd-assist-config/src/schema.rs
// ============================================================================
// Module: Document Schemas
// Description: JSON schema builders for the config file and policy documents.
// Purpose: Publish canonical validation schemas for tooling and CI checks.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! JSON Schemas (draft 2020-12) for `bhd-assist.toml`, the pattern catalog
//! document, and the selection rule document. The schemas describe shape
//! only; regex compilation and id uniqueness are enforced by the loaders.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::config::MAX_PATH_COMPONENT_LENGTH;
use crate::config::MAX_REDACT_KEYS;
use crate::config::MAX_TOTAL_PATH_LENGTH;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Semantic version pattern shared by both policy documents.
const VERSION_PATTERN: &str = r"^[0-9]+\.[0-9]+\.[0-9]+$";

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Returns the JSON schema for `bhd-assist.toml`.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "bhd-assist://schemas/config.schema.json",
        "title": "BHD Assist Configuration",
        "type": "object",
        "properties": {
            "audit": {
                "type": "object",
                "properties": {
                    "path": path_schema("Append-only JSONL decision log."),
                    "hash_chain": {
                        "type": "boolean",
                        "default": true,
                        "description": "Adds prev_hash and hash to every record."
                    },
                    "redact_keys": {
                        "type": "array",
                        "items": { "type": "string", "minLength": 1 },
                        "maxItems": MAX_REDACT_KEYS,
                        "default": []
                    }
                },
                "additionalProperties": false
            },
            "policy": {
                "type": "object",
                "properties": {
                    "catalog": path_schema("Pattern catalog document (TOML).")
                },
                "additionalProperties": false
            },
            "selector": {
                "type": "object",
                "properties": {
                    "rules": path_schema("Selection rule document (YAML or TOML).")
                },
                "additionalProperties": false
            }
        },
        "additionalProperties": false
    })
}

/// Returns the JSON schema for the pattern catalog document.
#[must_use]
pub fn pattern_catalog_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "bhd-assist://schemas/pattern-catalog.schema.json",
        "title": "BHD Assist Pattern Catalog",
        "type": "object",
        "required": ["version", "patterns"],
        "properties": {
            "version": version_schema(),
            "patterns": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "pattern", "scope"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "pattern": {
                            "type": "string",
                            "minLength": 1,
                            "description": "Case-insensitive regular expression."
                        },
                        "scope": {
                            "type": "string",
                            "enum": ["always", "level:validation_only", "level:lab_training"]
                        },
                        "description": { "type": "string" }
                    },
                    "additionalProperties": false
                }
            }
        },
        "additionalProperties": false
    })
}

/// Returns the JSON schema for the selection rule document.
#[must_use]
pub fn selection_rules_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "bhd-assist://schemas/selection-rules.schema.json",
        "title": "BHD Assist Selection Rules",
        "type": "object",
        "required": ["version", "rules"],
        "properties": {
            "version": version_schema(),
            "rules": {
                "type": "array",
                "items": selection_rule_schema()
            }
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Schema for one selection rule.
fn selection_rule_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "test_types", "priority", "target_id", "conditions"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "description": { "type": "string" },
            "test_types": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 },
                "minItems": 1,
                "uniqueItems": true
            },
            "priority": { "type": "integer" },
            "target_id": { "type": "string", "minLength": 1 },
            "conditions": {
                "type": "array",
                "items": condition_schema(),
                "minItems": 1
            }
        },
        "additionalProperties": false
    })
}

/// Schema for one selection condition.
fn condition_schema() -> Value {
    let ordering = ["greater_than", "greater_than_or_equal", "less_than", "less_than_or_equal"];
    json!({
        "type": "object",
        "required": ["field", "comparison"],
        "properties": {
            "field": { "type": "string", "minLength": 1 },
            "comparison": {
                "type": "string",
                "enum": [
                    "equals", "not_equals", "in_set", "contains", "exists",
                    "greater_than", "greater_than_or_equal", "less_than", "less_than_or_equal"
                ]
            },
            "value": {
                "type": ["string", "number", "boolean", "null", "array"]
            },
            "category": { "type": "string", "minLength": 1 }
        },
        "additionalProperties": false,
        "allOf": [
            {
                "if": { "properties": { "comparison": { "const": "exists" } } },
                "then": { "not": { "required": ["value"] } },
                "else": { "required": ["value"] }
            },
            {
                "if": { "properties": { "comparison": { "const": "in_set" } } },
                "then": { "properties": { "value": { "type": "array", "minItems": 1 } } }
            },
            {
                "if": { "properties": { "comparison": { "enum": ordering } } },
                "then": { "properties": { "value": { "type": "number" } } }
            }
        ]
    })
}

/// Schema for a semantic version string.
fn version_schema() -> Value {
    json!({
        "type": "string",
        "pattern": VERSION_PATTERN,
        "description": "Semantic version MAJOR.MINOR.PATCH."
    })
}

/// Schema for a bounded filesystem path.
fn path_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "maxLength": MAX_TOTAL_PATH_LENGTH,
        "description": format!(
            "{description} Relative paths resolve against the config directory; components \
             are limited to {MAX_PATH_COMPONENT_LENGTH} bytes."
        )
    })
}

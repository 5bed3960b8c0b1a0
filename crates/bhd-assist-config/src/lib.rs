// crates/bhd-assist-config/src/lib.rs
// ============================================================================
// Module: BHD Assist Config Library
// Description: Config model, policy documents, and their schemas.
// Purpose: Single source of truth for declarative assistant configuration.
// Dependencies: bhd-assist-core, serde, serde_yaml, toml
// ============================================================================

//! ## Overview
//! `bhd-assist-config` loads `bhd-assist.toml`, the pattern catalog
//! document, and the selection rule document, validating each before the
//! policy core sees it. Bundled defaults and JSON Schemas for every document
//! live here as well.
//!
//! Security posture: config inputs are untrusted and fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod documents;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use documents::*;
pub use schema::config_schema;
pub use schema::pattern_catalog_schema;
pub use schema::selection_rules_schema;

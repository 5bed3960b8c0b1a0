// crates/bhd-assist-core/src/core/mod.rs
// ============================================================================
// Module: BHD Assist Core Types
// Description: Levels, context, policy, selection, and audit data models.
// Purpose: Provide stable, serializable types shared by the runtime and callers.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types are plain data. Evaluation lives in [`crate::runtime`]; these
//! modules only describe inputs, outputs, and the invariants that hold
//! between them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod context;
pub mod error;
pub mod hashing;
pub mod identifiers;
pub mod level;
pub mod observation;
pub mod policy;
pub mod selection;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DEFAULT_REDACTED_KEYS;
pub use audit::DecisionEvent;
pub use audit::DecisionLogEntry;
pub use audit::REDACTED_SENTINEL;
pub use audit::RedactedDetails;
pub use audit::Redactor;
pub use context::AssistanceContext;
pub use context::AssistanceRequest;
pub use context::Environment;
pub use context::LevelResolution;
pub use context::RequestedLevel;
pub use context::TargetOwner;
pub use error::ConfigurationError;
pub use error::validate_version;
pub use identifiers::ObservationId;
pub use identifiers::PatternId;
pub use identifiers::RuleId;
pub use identifiers::TargetId;
pub use level::AssistanceLevel;
pub use observation::Observation;
pub use observation::ObservationError;
pub use policy::GuardVerdict;
pub use policy::PatternRule;
pub use policy::PatternScope;
pub use policy::StructuredVerdict;
pub use selection::Comparison;
pub use selection::SelectionCondition;
pub use selection::SelectionResult;
pub use selection::SelectionRule;
pub use selection::SelectionTrace;
pub use time::AuditTimestamp;

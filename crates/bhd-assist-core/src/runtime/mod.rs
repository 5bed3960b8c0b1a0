// crates/bhd-assist-core/src/runtime/mod.rs
// ============================================================================
// Module: BHD Assist Runtime
// Description: Evaluation engines and the audited guidance gate.
// Purpose: Turn static policy data and request inputs into audited decisions.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The resolver, guard, and selector are pure functions over immutable
//! inputs and need no locking. The decision log writers are the only
//! components with mutable state.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit_log;
pub mod catalog;
pub mod comparator;
pub mod context;
pub mod gate;
pub mod guard;
pub mod selector;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit_log::AuditLogOptions;
pub use audit_log::AuditRecord;
pub use audit_log::AuditStorage;
pub use audit_log::ChainReport;
pub use audit_log::InMemoryAuditLog;
pub use audit_log::JsonlAuditLog;
pub use audit_log::verify_chain;
pub use audit_log::verify_chain_file;
pub use catalog::CompiledPattern;
pub use catalog::PatternCatalog;
pub use context::resolve;
pub use gate::GateError;
pub use gate::GuidanceGate;
pub use guard::ContentGuard;
pub use selector::SelectionRuleSet;
pub use selector::select;

// crates/bhd-assist-core/src/lib.rs
// ============================================================================
// Module: BHD Assist Core Library
// Description: Public API surface for the assistant policy core.
// Purpose: Expose level resolution, content guarding, playbook selection, and audit logging.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The policy core decides how much guidance a request may receive, blocks
//! disallowed guidance text, recommends validation playbooks from
//! observations, and records every one of those decisions in an append-only
//! audit log. It performs no network I/O and does not render or export
//! content itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuditError;
pub use interfaces::AuditSink;
pub use runtime::AuditLogOptions;
pub use runtime::AuditRecord;
pub use runtime::AuditStorage;
pub use runtime::ChainReport;
pub use runtime::CompiledPattern;
pub use runtime::ContentGuard;
pub use runtime::GateError;
pub use runtime::GuidanceGate;
pub use runtime::InMemoryAuditLog;
pub use runtime::JsonlAuditLog;
pub use runtime::PatternCatalog;
pub use runtime::SelectionRuleSet;
pub use runtime::resolve;
pub use runtime::select;
pub use runtime::verify_chain;
pub use runtime::verify_chain_file;

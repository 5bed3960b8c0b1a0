// crates/bhd-assist-core/src/interfaces/mod.rs
// ============================================================================
// Module: BHD Assist Interfaces
// Description: Storage contract for the decision audit log.
// Purpose: Let the gate append decisions without knowing the backing store.
// Dependencies: thiserror, crate::core
// ============================================================================

//! ## Overview
//! The audit sink is the only mutable collaborator of the policy core.
//! Implementations must serialize concurrent appends and must report storage
//! failure instead of dropping entries: a decision that cannot be audited
//! must not proceed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::DecisionLogEntry;

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Audit log failures.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Storage I/O failed.
    #[error("audit io error: {0}")]
    Io(String),
    /// An entry could not be serialized or hashed.
    #[error("audit serialization error: {0}")]
    Serialization(String),
    /// The writer lock was poisoned by a panicking writer.
    #[error("audit writer lock poisoned")]
    Poisoned,
    /// A failed write could not be rolled back; the writer refuses further appends.
    #[error("audit writer halted after a partial write could not be rolled back")]
    Halted,
    /// An existing log line could not be parsed.
    #[error("audit log line {line} is corrupt: {message}")]
    Corrupt {
        /// One-based line number.
        line: usize,
        /// Parse failure detail.
        message: String,
    },
    /// A hash chain link does not verify.
    #[error("audit chain broken at sequence {sequence}: {message}")]
    ChainBroken {
        /// Sequence number of the first bad record.
        sequence: u64,
        /// Verification failure detail.
        message: String,
    },
}

/// Append-only destination for decision log entries.
pub trait AuditSink: Send + Sync {
    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the entry cannot be durably recorded.
    fn append(&self, entry: DecisionLogEntry) -> Result<(), AuditError>;
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn append(&self, entry: DecisionLogEntry) -> Result<(), AuditError> {
        (**self).append(entry)
    }
}

impl<T: AuditSink + ?Sized> AuditSink for &T {
    fn append(&self, entry: DecisionLogEntry) -> Result<(), AuditError> {
        (**self).append(entry)
    }
}

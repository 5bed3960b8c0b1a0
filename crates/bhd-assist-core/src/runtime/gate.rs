// crates/bhd-assist-core/src/runtime/gate.rs
// ============================================================================
// Module: BHD Assist Guidance Gate
// Description: Composes level resolution, content guarding, and selection with auditing.
// Purpose: Ensure every policy decision is audited before it is returned.
// Dependencies: serde_json, thiserror, tracing, crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`GuidanceGate`] is the single entry point callers use at runtime. Each
//! operation computes its decision with the pure components, builds a
//! redacted [`DecisionLogEntry`], and appends it to the audit sink. If the
//! append fails the decision is discarded and [`GateError::Audit`] is
//! returned: an unaudited decision never reaches the caller.
//!
//! Security posture: candidate text is never logged; only its length and
//! SHA-256 fingerprint are recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::AssistanceContext;
use crate::core::AssistanceLevel;
use crate::core::AssistanceRequest;
use crate::core::ConfigurationError;
use crate::core::DecisionEvent;
use crate::core::DecisionLogEntry;
use crate::core::GuardVerdict;
use crate::core::LevelResolution;
use crate::core::Observation;
use crate::core::Redactor;
use crate::core::SelectionResult;
use crate::core::StructuredVerdict;
use crate::core::hashing::fingerprint;
use crate::interfaces::AuditError;
use crate::interfaces::AuditSink;
use crate::runtime::catalog::PatternCatalog;
use crate::runtime::context::resolve;
use crate::runtime::guard::ContentGuard;
use crate::runtime::selector::SelectionRuleSet;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gate operation failures.
#[derive(Debug, Error)]
pub enum GateError {
    /// The decision could not be audited.
    #[error(transparent)]
    Audit(#[from] AuditError),
    /// The request was invalid (reserved level).
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Audited composition of the policy components.
///
/// # Invariants
/// - Every successful call appends exactly one entry.
/// - Shared state (catalog, rules) is read-only.
pub struct GuidanceGate<S: AuditSink> {
    /// Content guard over the shared catalog.
    guard: ContentGuard,
    /// Shared selection rules.
    rules: Arc<SelectionRuleSet>,
    /// Audit destination.
    sink: S,
    /// Detail redactor applied before entries are built.
    redactor: Redactor,
}

impl<S: AuditSink> GuidanceGate<S> {
    /// Creates a gate with the default redactor.
    #[must_use]
    pub fn new(catalog: Arc<PatternCatalog>, rules: Arc<SelectionRuleSet>, sink: S) -> Self {
        Self {
            guard: ContentGuard::new(catalog),
            rules,
            sink,
            redactor: Redactor::default(),
        }
    }

    /// Replaces the detail redactor.
    #[must_use]
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Returns the audit sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the content guard.
    #[must_use]
    pub const fn guard(&self) -> &ContentGuard {
        &self.guard
    }

    /// Returns the selection rules.
    #[must_use]
    pub fn rules(&self) -> &SelectionRuleSet {
        &self.rules
    }

    /// Resolves the effective level and appends `level_resolved`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Audit`] when the decision cannot be recorded.
    pub fn resolve_level(&self, context: &AssistanceContext) -> Result<LevelResolution, GateError> {
        let resolution = resolve(context);
        if resolution.clamped {
            warn!(
                requested = %context.requested_level,
                reason = %resolution.reasons.join("; "),
                "deep lab request clamped to validation only"
            );
        } else {
            info!(level = %resolution.effective_level, "assistance level resolved");
        }
        let details = details([
            ("environment", context.environment.to_string()),
            ("authorized", context.authorized.to_string()),
            ("target_owner", context.target_owner.to_string()),
            ("requested_level", context.requested_level.to_string()),
            ("effective_level", resolution.effective_level.to_string()),
            ("clamped", resolution.clamped.to_string()),
            ("reasons", resolution.reasons.join("; ")),
        ]);
        self.record(DecisionEvent::LevelResolved, resolution.effective_level, details)?;
        Ok(resolution)
    }

    /// Normalizes a raw request and resolves it. A reserved-level request
    /// appends `context_rejected` and fails.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Configuration`] for reserved-level requests and
    /// [`GateError::Audit`] when the decision cannot be recorded.
    pub fn resolve_request(&self, request: &AssistanceRequest) -> Result<LevelResolution, GateError> {
        match request.normalize() {
            Ok(context) => self.resolve_level(&context),
            Err(err) => {
                warn!(requested = %request.requested_level, error = %err, "assistance request rejected");
                let details = details([
                    ("environment", request.environment.clone()),
                    ("requested_level", request.requested_level.clone()),
                    ("reason", err.to_string()),
                ]);
                self.record(DecisionEvent::ContextRejected, AssistanceLevel::ValidationOnly, details)?;
                Err(GateError::Configuration(err))
            }
        }
    }

    /// Checks candidate text and appends `content_allowed` or `content_blocked`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Audit`] when the decision cannot be recorded.
    pub fn check_content(
        &self,
        text: &str,
        level: AssistanceLevel,
        source: &str,
    ) -> Result<GuardVerdict, GateError> {
        let verdict = self.guard.evaluate(text, level);
        let mut fields = vec![
            ("source", source.to_string()),
            ("text_length", text.chars().count().to_string()),
            ("text_sha256", fingerprint(text)),
        ];
        self.push_verdict_details(&verdict, &mut fields);
        let event = log_verdict(&verdict, source, None);
        self.record(event, level, details(fields))?;
        Ok(verdict)
    }

    /// Checks every string field of a structured response and appends one
    /// `content_allowed` or `content_blocked` entry.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Audit`] when the decision cannot be recorded.
    pub fn check_structured(
        &self,
        value: &Value,
        level: AssistanceLevel,
        source: &str,
    ) -> Result<StructuredVerdict, GateError> {
        let outcome = self.guard.evaluate_structured(value, level);
        let mut fields = vec![
            ("source", source.to_string()),
            ("fields_checked", outcome.fields_checked.to_string()),
        ];
        if let Some(field) = &outcome.field {
            fields.push(("field", field.clone()));
        }
        self.push_verdict_details(&outcome.verdict, &mut fields);
        let event = log_verdict(&outcome.verdict, source, outcome.field.as_deref());
        self.record(event, level, details(fields))?;
        Ok(outcome)
    }

    /// Selects a playbook and appends `playbook_selected`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Audit`] when the decision cannot be recorded.
    pub fn select_playbook(
        &self,
        test_type: &str,
        observations: &[Observation],
        level: AssistanceLevel,
    ) -> Result<SelectionResult, GateError> {
        let result = self.rules.select(test_type, observations);
        info!(
            test_type,
            selected = result.selected_target_id.as_ref().map(|id| id.as_str()),
            matched = result.matched_count(),
            "playbook selected"
        );
        let none = || "none".to_string();
        let details = details([
            ("test_type", test_type.to_string()),
            ("observations", observations.len().to_string()),
            ("rules_evaluated", result.evaluated_rules.len().to_string()),
            ("rules_matched", result.matched_count().to_string()),
            (
                "selected_target_id",
                result.selected_target_id.as_ref().map_or_else(none, ToString::to_string),
            ),
            (
                "selected_rule_id",
                result.selected_rule_id.as_ref().map_or_else(none, ToString::to_string),
            ),
        ]);
        self.record(DecisionEvent::PlaybookSelected, level, details)?;
        Ok(result)
    }

    /// Appends `export_completed` with caller-supplied details.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Audit`] when the event cannot be recorded.
    pub fn record_export(
        &self,
        level: AssistanceLevel,
        export_details: BTreeMap<String, String>,
    ) -> Result<(), GateError> {
        info!(level = %level, fields = export_details.len(), "export recorded");
        self.record(DecisionEvent::ExportCompleted, level, export_details)
    }

    /// Adds rule identity and raw pattern (redacted downstream) for blocks.
    fn push_verdict_details(&self, verdict: &GuardVerdict, fields: &mut Vec<(&str, String)>) {
        fields.push(("allowed", verdict.allowed.to_string()));
        let (Some(rule_id), Some(scope)) = (&verdict.matched_rule_id, verdict.matched_scope) else {
            return;
        };
        fields.push(("rule_id", rule_id.to_string()));
        fields.push(("scope", scope.to_string()));
        if let Some(pattern) =
            self.guard.catalog().patterns().iter().find(|pattern| &pattern.rule().id == rule_id)
        {
            fields.push(("pattern", pattern.rule().pattern.clone()));
        }
    }

    /// Redacts details and appends one entry.
    fn record(
        &self,
        event: DecisionEvent,
        level: AssistanceLevel,
        details: BTreeMap<String, String>,
    ) -> Result<(), GateError> {
        let entry = DecisionLogEntry::new(event, level, self.redactor.redact(details));
        self.sink.append(entry).map_err(|err| {
            error!(event = %event, error = %err, "decision could not be audited");
            GateError::Audit(err)
        })
    }
}

/// Emits the tracing event for a verdict and returns its audit event type.
fn log_verdict(verdict: &GuardVerdict, source: &str, field: Option<&str>) -> DecisionEvent {
    if verdict.allowed {
        debug!(source, level = %verdict.level_used, "content allowed");
        DecisionEvent::ContentAllowed
    } else {
        warn!(
            source,
            field,
            rule_id = verdict.matched_rule_id.as_ref().map(|id| id.as_str()),
            level = %verdict.level_used,
            "content blocked"
        );
        DecisionEvent::ContentBlocked
    }
}

/// Builds a detail map from static keys.
fn details<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

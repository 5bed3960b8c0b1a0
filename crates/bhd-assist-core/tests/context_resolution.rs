//! Assistance level resolution tests for bhd-assist-core.
// crates/bhd-assist-core/tests/context_resolution.rs
// =============================================================================
// Module: Context Resolution Tests
// Description: Clamping order, reason strings, and reserved-level rejection.
// Purpose: Ensure level resolution always fails toward the most restrictive level.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use bhd_assist_core::AssistanceContext;
use bhd_assist_core::AssistanceLevel;
use bhd_assist_core::AssistanceRequest;
use bhd_assist_core::ConfigurationError;
use bhd_assist_core::Environment;
use bhd_assist_core::RequestedLevel;
use bhd_assist_core::TargetOwner;
use bhd_assist_core::resolve;

mod common;

use common::TestResult;

fn deep_lab(environment: &str, authorized: bool, owner: &str) -> AssistanceContext {
    AssistanceContext::new(
        Environment::parse(environment),
        authorized,
        TargetOwner::parse(owner),
        RequestedLevel::DeepLab,
    )
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

#[test]
fn prod_client_deep_lab_is_clamped_naming_environment() -> TestResult {
    let resolution = resolve(&deep_lab("prod_client", false, "unknown"));
    if resolution.effective_level != AssistanceLevel::ValidationOnly {
        return Err(format!("unexpected level {}", resolution.effective_level));
    }
    if resolution.reasons != ["clamped: environment=prod_client (requires lab or ctf)"] {
        return Err(format!("unexpected reasons {:?}", resolution.reasons));
    }
    if !resolution.clamped {
        return Err("resolution should be marked clamped".to_string());
    }
    Ok(())
}

#[test]
fn lab_authorized_self_enables_lab_training() -> TestResult {
    let resolution = resolve(&deep_lab("lab", true, "self"));
    if resolution.effective_level != AssistanceLevel::LabTraining {
        return Err(format!("unexpected level {}", resolution.effective_level));
    }
    if resolution.reasons
        != ["deep_lab_enabled: environment=lab/ctf, authorized=true, target_owner=self"]
    {
        return Err(format!("unexpected reasons {:?}", resolution.reasons));
    }
    Ok(())
}

#[test]
fn standard_request_is_validation_only_everywhere() -> TestResult {
    let context = AssistanceContext::new(
        Environment::Ctf,
        true,
        TargetOwner::SelfOwned,
        RequestedLevel::Standard,
    );
    let resolution = resolve(&context);
    if resolution.effective_level != AssistanceLevel::ValidationOnly
        || resolution.reasons != ["requested_level=standard"]
        || resolution.clamped
    {
        return Err(format!("unexpected resolution {resolution:?}"));
    }
    Ok(())
}

// ============================================================================
// SECTION: Clamp Order
// ============================================================================

#[test]
fn first_unmet_requirement_wins() -> TestResult {
    let cases = [
        (deep_lab("prod_client", false, "client"), "clamped: environment=prod_client"),
        (deep_lab("ctf", false, "client"), "clamped: authorized=false (requires true)"),
        (deep_lab("lab", true, "client"), "clamped: target_owner=client (requires self)"),
        (deep_lab("lab", true, "unknown"), "clamped: target_owner=unknown (requires self)"),
        (deep_lab("lab", true, "SELF-ish"), "clamped: target_owner=SELF-ish (requires self)"),
    ];
    for (context, expected) in cases {
        let resolution = resolve(&context);
        if resolution.effective_level != AssistanceLevel::ValidationOnly {
            return Err(format!("{context:?} was not clamped"));
        }
        if resolution.reasons.len() != 1 || !resolution.reasons[0].starts_with(expected) {
            return Err(format!("{context:?}: expected {expected}, got {:?}", resolution.reasons));
        }
    }
    Ok(())
}

#[test]
fn enum_values_are_normalized_case_insensitively() -> TestResult {
    let resolution = resolve(&deep_lab(" CTF ", true, "Self"));
    if resolution.effective_level != AssistanceLevel::LabTraining {
        return Err(format!("unexpected resolution {resolution:?}"));
    }
    Ok(())
}

// ============================================================================
// SECTION: Raw Requests
// ============================================================================

#[test]
fn reserved_request_is_a_configuration_error() -> TestResult {
    for raw in ["reserved", "RESERVED", "2", "level_2"] {
        let request = AssistanceRequest {
            environment: "lab".to_string(),
            authorized: true,
            target_owner: "self".to_string(),
            requested_level: raw.to_string(),
        };
        match request.normalize() {
            Err(ConfigurationError::ReservedLevel) => {}
            other => return Err(format!("{raw}: expected reserved error, got {other:?}")),
        }
    }
    Ok(())
}

#[test]
fn request_defaults_are_most_restrictive() -> TestResult {
    let request: AssistanceRequest =
        serde_json::from_str(r#"{"environment": "lab"}"#).map_err(|err| err.to_string())?;
    let context = request.normalize().map_err(|err| err.to_string())?;
    if context.authorized
        || context.target_owner != TargetOwner::Unknown
        || context.requested_level != RequestedLevel::Standard
    {
        return Err(format!("unexpected defaults {context:?}"));
    }
    Ok(())
}

#[test]
fn context_deserialization_rejects_reserved_level() -> TestResult {
    let raw = r#"{"environment":"lab","authorized":true,"target_owner":"self","requested_level":"reserved"}"#;
    match serde_json::from_str::<AssistanceContext>(raw) {
        Err(err) if err.to_string().contains("RESERVED is not implemented") => Ok(()),
        other => Err(format!("expected reserved rejection, got {other:?}")),
    }
}

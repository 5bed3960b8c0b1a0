//! Policy core property-based tests.
//!
//! ## Purpose
//! These tests exercise level resolution, the content guard, and the playbook
//! selector with randomized inputs to prove the fail-closed and determinism
//! guarantees hold beyond hand-picked examples.
//!
//! ## What is covered
//! - Standard requests never resolve above validation only.
//! - Lab training is granted if and only if every requirement holds.
//! - Always-blocked text is blocked at every level; verdicts are idempotent.
//! - Selection output is independent of repetition and stable for a given input.
// crates/bhd-assist-core/tests/proptest_properties.rs
// ============================================================================
// Module: Policy Core Property-Based Tests
// Description: Randomized checks for resolver, guard, and selector invariants.
// Purpose: Ensure invariants hold across arbitrary contexts, text, and observations.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use bhd_assist_core::AssistanceContext;
use bhd_assist_core::AssistanceLevel;
use bhd_assist_core::Environment;
use bhd_assist_core::Observation;
use bhd_assist_core::RequestedLevel;
use bhd_assist_core::TargetOwner;
use bhd_assist_core::resolve;
use bhd_assist_core::select;
use bhd_assist_core::runtime::guard::evaluate;
use proptest::prelude::*;

mod common;

fn environment() -> impl Strategy<Value = Environment> {
    prop_oneof![
        Just(Environment::ProdClient),
        Just(Environment::Lab),
        Just(Environment::Ctf),
        "[a-z_]{0,12}".prop_map(|raw| Environment::parse(&raw)),
    ]
}

fn target_owner() -> impl Strategy<Value = TargetOwner> {
    prop_oneof![
        Just(TargetOwner::SelfOwned),
        Just(TargetOwner::Client),
        Just(TargetOwner::Unknown),
        "[a-z]{0,8}".prop_map(|raw| TargetOwner::parse(&raw)),
    ]
}

fn requested_level() -> impl Strategy<Value = RequestedLevel> {
    prop_oneof![
        Just(RequestedLevel::Standard),
        Just(RequestedLevel::DeepLab),
        "[a-z]{1,8}".prop_filter_map("reserved is rejected at parse time", |raw| {
            RequestedLevel::parse(&raw).ok()
        }),
    ]
}

fn context() -> impl Strategy<Value = AssistanceContext> {
    (environment(), any::<bool>(), target_owner(), requested_level()).prop_map(
        |(environment, authorized, target_owner, requested_level)| {
            AssistanceContext::new(environment, authorized, target_owner, requested_level)
        },
    )
}

fn observation() -> impl Strategy<Value = Observation> {
    (
        "[a-z]{1,6}",
        prop::sample::select(vec!["port", "service", "authorization"]),
        prop::sample::select(vec!["web", "network", "ics"]),
        prop::sample::select(vec![22_u16, 80, 443, 502, 4840, 8080]),
        prop::sample::select(vec!["ssh", "http", "modbus", "rdp"]),
        any::<bool>(),
    )
        .prop_map(|(id, category, test_type, port, service, bypass)| {
            Observation::new(id, category, test_type)
                .with_field("port", port)
                .with_field("service", service)
                .with_field("status_code", 200)
                .with_field("url_pattern", "/items/{id}")
                .with_field("authz_bypass_indicator", bypass)
        })
}

proptest! {
    #[test]
    fn standard_requests_never_exceed_validation_only(
        environment in environment(),
        authorized in any::<bool>(),
        target_owner in target_owner(),
    ) {
        let context =
            AssistanceContext::new(environment, authorized, target_owner, RequestedLevel::Standard);
        prop_assert_eq!(resolve(&context).effective_level, AssistanceLevel::ValidationOnly);
    }

    #[test]
    fn lab_training_iff_every_requirement_holds(context in context()) {
        let resolution = resolve(&context);
        let expected = matches!(context.environment, Environment::Lab | Environment::Ctf)
            && context.authorized
            && context.target_owner == TargetOwner::SelfOwned
            && context.requested_level == RequestedLevel::DeepLab;
        prop_assert_eq!(resolution.effective_level == AssistanceLevel::LabTraining, expected);
        prop_assert_ne!(resolution.effective_level, AssistanceLevel::Reserved);
        prop_assert!(!resolution.reasons.is_empty());
    }

    #[test]
    fn always_blocked_text_is_blocked_at_every_level(
        prefix in "[a-zA-Z ]{0,24}",
        suffix in "[a-zA-Z ]{0,24}",
        index in 0..common::ALWAYS_PATTERNS.len(),
    ) {
        let catalog = common::catalog().map_err(TestCaseError::fail)?;
        let phrases = [
            "exploit code", "payload generation", "bypass authentication",
            "persistence mechanism", "privilege escalation steps", "exfiltration method",
            "weaponized script", "reverse shell", "backdoor", "malware",
        ];
        let text = format!("{prefix} {} {suffix}", phrases[index]);
        for level in
            [AssistanceLevel::ValidationOnly, AssistanceLevel::LabTraining, AssistanceLevel::Reserved]
        {
            prop_assert!(!evaluate(&catalog, &text, level).allowed);
        }
    }

    #[test]
    fn guard_verdicts_are_idempotent(text in ".{0,64}", lab in any::<bool>()) {
        let catalog = common::catalog().map_err(TestCaseError::fail)?;
        let level =
            if lab { AssistanceLevel::LabTraining } else { AssistanceLevel::ValidationOnly };
        let first = evaluate(&catalog, &text, level);
        let second = evaluate(&catalog, &text, level);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn selection_is_deterministic(
        observations in prop::collection::vec(observation(), 0..6),
        test_type in prop::sample::select(vec!["web", "network", "ics", "ot", "mobile"]),
    ) {
        let rules = common::standard_rules();
        let first = select(test_type, &observations, &rules);
        let second = select(test_type, &observations, &rules);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.evaluated_rules.len(), rules.len());
        let matched_priority = first
            .evaluated_rules
            .iter()
            .filter(|trace| trace.matched)
            .map(|trace| trace.priority)
            .max();
        let selected_priority = first.selected_rule_id.as_ref().and_then(|id| {
            first.evaluated_rules.iter().find(|trace| &trace.rule_id == id).map(|trace| trace.priority)
        });
        prop_assert_eq!(matched_priority, selected_priority);
    }
}

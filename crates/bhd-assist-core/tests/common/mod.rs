// crates/bhd-assist-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared catalogs, rule sets, and observations for integration tests.
// Purpose: Keep policy fixtures consistent across test files.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use bhd_assist_core::AssistanceLevel;
use bhd_assist_core::Comparison;
use bhd_assist_core::Observation;
use bhd_assist_core::PatternCatalog;
use bhd_assist_core::PatternRule;
use bhd_assist_core::PatternScope;
use bhd_assist_core::SelectionCondition;
use bhd_assist_core::SelectionRule;
use bhd_assist_core::SelectionRuleSet;
use serde_json::json;

pub type TestResult = Result<(), String>;

/// Always-blocked patterns, one per rule.
pub const ALWAYS_PATTERNS: &[(&str, &str)] = &[
    ("always-001", r"\bexploit\s+code\b"),
    ("always-002", r"\bpayload\s+generation\b"),
    ("always-003", r"\bbypass\s+(authentication|authorization)\b"),
    ("always-004", r"\bpersistence\s+mechanism\b"),
    ("always-005", r"\bprivilege\s+escalation\s+step"),
    ("always-006", r"\bexfiltration\s+method\b"),
    ("always-007", r"\bweaponized?\s+(script|tool|payload)\b"),
    ("always-008", r"\breverser?\s+shell\b"),
    ("always-009", r"\bbackdoor\b"),
    ("always-010", r"\bmalware\b"),
];

/// Validation-only patterns.
pub const VALIDATION_ONLY_PATTERNS: &[(&str, &str)] = &[
    ("validation-001", r"\bhow\s+to\s+exploit.*step-by-step\b"),
    ("validation-002", r"\binjection\s+payload.*example\b"),
];

pub fn catalog() -> Result<PatternCatalog, String> {
    let mut rules: Vec<PatternRule> = ALWAYS_PATTERNS
        .iter()
        .map(|(id, pattern)| PatternRule::new(*id, *pattern, PatternScope::Always))
        .collect();
    rules.extend(VALIDATION_ONLY_PATTERNS.iter().map(|(id, pattern)| {
        PatternRule::new(*id, *pattern, PatternScope::Level(AssistanceLevel::ValidationOnly))
    }));
    PatternCatalog::new("1.0.0", rules).map_err(|err| err.to_string())
}

pub fn rule(
    id: &str,
    test_types: &[&str],
    priority: i64,
    target_id: &str,
    conditions: Vec<SelectionCondition>,
) -> SelectionRule {
    SelectionRule {
        id: id.into(),
        test_types: test_types.iter().map(|t| (*t).to_string()).collect(),
        priority,
        target_id: target_id.into(),
        conditions,
        description: None,
    }
}

pub fn equals(field: &str, value: serde_json::Value) -> SelectionCondition {
    SelectionCondition::new(field, Comparison::Equals, Some(value))
}

/// Web, network, and ICS rules mirroring the bundled defaults.
pub fn standard_rules() -> Vec<SelectionRule> {
    vec![
        rule(
            "web_idor_candidate",
            &["web"],
            100,
            "idor_validation",
            vec![
                SelectionCondition::new("url_pattern", Comparison::Exists, None)
                    .in_category("service"),
                equals("status_code", json!(200)).in_category("service"),
            ],
        ),
        rule(
            "web_broken_access",
            &["web"],
            95,
            "authz_broken_access",
            vec![equals("authz_bypass_indicator", json!(true)).in_category("authorization")],
        ),
        rule(
            "network_exposed_admin_service",
            &["network"],
            90,
            "exposed_admin_interfaces",
            vec![SelectionCondition::new(
                "service",
                Comparison::InSet,
                Some(json!(["ssh", "rdp", "telnet", "vnc"])),
            )],
        ),
        rule(
            "ics_modbus_exposure",
            &["ics", "ot"],
            85,
            "modbus_exposure",
            vec![equals("port", json!(502))],
        ),
        rule(
            "ot_opcua_exposure",
            &["ics", "ot"],
            85,
            "opcua_exposure",
            vec![equals("port", json!(4840))],
        ),
    ]
}

pub fn rule_set() -> Result<SelectionRuleSet, String> {
    SelectionRuleSet::new("1.0.0", standard_rules()).map_err(|err| err.to_string())
}

pub fn port_observation(id: &str, port: u16, service: &str) -> Observation {
    Observation::new(id, "port", "network")
        .with_field("port", port)
        .with_field("service", service)
}

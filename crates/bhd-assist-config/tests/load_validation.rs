//! Config loading tests for bhd-assist-config.
// crates/bhd-assist-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Fail-closed loading of bhd-assist.toml.
// Purpose: Ensure limits, unknown keys, and path resolution behave as documented.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::Path;

use bhd_assist_config::AssistConfig;
use bhd_assist_config::ConfigError;
use bhd_assist_core::AssistanceLevel;
use tempfile::TempDir;

type TestResult = Result<(), String>;

fn write(dir: &TempDir, name: &str, content: &str) -> Result<std::path::PathBuf, String> {
    let path = dir.path().join(name);
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok(path)
}

fn assert_invalid(result: Result<AssistConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(ConfigError::Invalid(message)) if message.contains(needle) => Ok(()),
        Err(other) => Err(format!("expected invalid containing '{needle}', got {other}")),
        Ok(_) => Err(format!("expected invalid containing '{needle}', got Ok")),
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let config = AssistConfig::from_toml_str("").map_err(|err| err.to_string())?;
    assert!(config.audit.hash_chain);
    assert_eq!(config.audit.path, Path::new("decision_log.jsonl"));
    assert!(config.audit.redact_keys.is_empty());
    assert!(config.policy.catalog.is_none());
    assert!(config.selector.rules.is_none());
    Ok(())
}

#[test]
fn defaults_use_bundled_documents() -> TestResult {
    let config = AssistConfig::default();
    let catalog = config.pattern_catalog().map_err(|err| err.to_string())?;
    let rules = config.selection_rules().map_err(|err| err.to_string())?;
    assert!(catalog.active_patterns(AssistanceLevel::LabTraining).count() > 0);
    assert!(rules.rules().iter().any(|rule| rule.id.as_str() == "network_exposed_admin_service"));
    Ok(())
}

// ============================================================================
// SECTION: Fail-Closed Loading
// ============================================================================

#[test]
fn explicit_missing_file_is_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let result = AssistConfig::load(Some(&dir.path().join("absent.toml")));
    match result {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    let result = AssistConfig::from_toml_str("[audit]\npath = \"log.jsonl\"\nrotate = true\n");
    match result {
        Err(ConfigError::Parse(message)) if message.contains("rotate") => Ok(()),
        other => Err(format!("expected parse error naming 'rotate', got {other:?}")),
    }
}

#[test]
fn unknown_sections_are_rejected() -> TestResult {
    let result = AssistConfig::from_toml_str("[server]\nbind = \"0.0.0.0\"\n");
    if matches!(result, Err(ConfigError::Parse(_))) {
        Ok(())
    } else {
        Err(format!("expected parse error, got {result:?}"))
    }
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    let path = write(&dir, "big.toml", &padding)?;
    assert_invalid(AssistConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("latin1.toml");
    fs::write(&path, [0x23, 0x20, 0xff, 0xfe, 0x0a]).map_err(|err| err.to_string())?;
    assert_invalid(AssistConfig::load(Some(&path)), "must be utf-8")
}

#[test]
fn overlong_path_component_is_rejected() -> TestResult {
    let name = format!("{}.toml", "c".repeat(300));
    assert_invalid(AssistConfig::load(Some(Path::new(&name))), "path component too long")
}

#[test]
fn empty_audit_path_is_rejected() -> TestResult {
    assert_invalid(AssistConfig::from_toml_str("[audit]\npath = \"  \"\n"), "audit.path")
}

#[test]
fn blank_redact_key_is_rejected() -> TestResult {
    assert_invalid(
        AssistConfig::from_toml_str("[audit]\nredact_keys = [\"session\", \" \"]\n"),
        "audit.redact_keys[1]",
    )
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

#[test]
fn relative_paths_resolve_against_config_directory() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    write(
        &dir,
        "patterns.toml",
        "version = \"2.1.0\"\n[[patterns]]\nid = \"p-1\"\npattern = 'forbidden'\nscope = \
         \"always\"\n",
    )?;
    write(
        &dir,
        "rules.yaml",
        "version: \"0.3.0\"\nrules:\n  - id: r1\n    test_types: [web]\n    priority: 1\n    \
         target_id: t1\n    conditions:\n      - field: port\n        comparison: exists\n",
    )?;
    let config_path = write(
        &dir,
        "bhd-assist.toml",
        "[audit]\npath = \"logs/decisions.jsonl\"\nhash_chain = false\nredact_keys = \
         [\"Session_Cookie\"]\n\n[policy]\ncatalog = \"patterns.toml\"\n\n[selector]\nrules = \
         \"rules.yaml\"\n",
    )?;

    let config = AssistConfig::load(Some(&config_path)).map_err(|err| err.to_string())?;
    assert_eq!(config.audit_log_path(), dir.path().join("logs/decisions.jsonl"));
    assert!(!config.audit_log_options().hash_chain);

    let catalog = config.pattern_catalog().map_err(|err| err.to_string())?;
    assert_eq!(catalog.version(), "2.1.0");
    assert_eq!(catalog.len(), 1);

    let rules = config.selection_rules().map_err(|err| err.to_string())?;
    assert_eq!(rules.version(), "0.3.0");
    assert_eq!(rules.rules().len(), 1);
    Ok(())
}

#[test]
fn configured_redact_keys_extend_defaults() -> TestResult {
    let config = AssistConfig::from_toml_str("[audit]\nredact_keys = [\"Session_Cookie\", \"ssn\"]\n")
        .map_err(|err| err.to_string())?;
    let redactor = config.redactor();
    let details = redactor.redact(
        [
            ("ssn_last4".to_string(), "1234".to_string()),
            ("token_hint".to_string(), "abc".to_string()),
            ("source".to_string(), "cli".to_string()),
        ]
        .into_iter()
        .collect(),
    );
    assert!(details.is_redacted());
    assert_eq!(details.values().get("ssn_last4").map(String::as_str), Some("[REDACTED]"));
    assert_eq!(details.values().get("token_hint").map(String::as_str), Some("[REDACTED]"));
    assert_eq!(details.values().get("source").map(String::as_str), Some("cli"));
    Ok(())
}

#[test]
fn missing_catalog_file_surfaces_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let config_path = write(&dir, "bhd-assist.toml", "[policy]\ncatalog = \"nope.toml\"\n")?;
    let config = AssistConfig::load(Some(&config_path)).map_err(|err| err.to_string())?;
    match config.pattern_catalog() {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("expected io error, got {other}")),
        Ok(_) => Err("expected io error, got Ok".to_string()),
    }
}

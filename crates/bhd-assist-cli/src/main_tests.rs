// crates/bhd-assist-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, bounded reads, and commands.
// Purpose: Ensure the CLI records decisions and fails closed on bad input.
// Dependencies: bhd-assist-cli main helpers
// ============================================================================

//! ## Overview
//! Drives the command functions directly against a temporary audit log and
//! checks both the exit status and what was appended.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use bhd_assist_config::AssistConfig;
use bhd_assist_core::AssistanceLevel;
use bhd_assist_core::verify_chain_file;
use tempfile::TempDir;

use super::BLOCKED_EXIT_CODE;
use super::CheckCommand;
use super::ExportEventCommand;
use super::LevelCommand;
use super::ReadLimitError;
use super::SelectCommand;
use super::command_check;
use super::command_config_validate;
use super::command_export_event;
use super::command_level;
use super::command_select;
use super::parse_detail;
use super::parse_level;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config_in(dir: &TempDir) -> AssistConfig {
    let mut config = AssistConfig::default();
    config.audit.path = dir.path().join("audit").join("decision_log.jsonl");
    config
}

fn log_lines(config: &AssistConfig) -> Vec<String> {
    fs::read_to_string(config.audit_log_path())
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn check(level: AssistanceLevel, text: &str) -> CheckCommand {
    CheckCommand {
        level,
        source: "unit-test".to_string(),
        text: Some(text.to_string()),
        input: None,
        structured: false,
    }
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn parse_detail_splits_on_first_equals() {
    assert_eq!(
        parse_detail("query=a=b").unwrap(),
        ("query".to_string(), "a=b".to_string())
    );
    assert!(parse_detail("missing").is_err());
    assert!(parse_detail(" =value").is_err());
}

#[test]
fn parse_level_rejects_reserved() {
    assert_eq!(parse_level("lab_training").unwrap(), AssistanceLevel::LabTraining);
    assert_eq!(parse_level("standard").unwrap(), AssistanceLevel::ValidationOnly);
    let err = parse_level("reserved").unwrap_err();
    assert!(err.contains("RESERVED"));
}

#[test]
fn read_bytes_with_limit_rejects_oversized_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.txt");
    fs::write(&path, vec![b'a'; 32]).unwrap();
    match read_bytes_with_limit(&path, 16) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 32);
            assert_eq!(limit, 16);
        }
        other => panic!("expected size limit error, got {other:?}"),
    }
    assert_eq!(read_bytes_with_limit(&path, 32).unwrap().len(), 32);
}

// ============================================================================
// SECTION: Commands
// ============================================================================

#[test]
fn check_exits_with_blocked_code_and_records_decision() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let blocked = command_check(&config, &check(AssistanceLevel::LabTraining, "drop a backdoor"))
        .unwrap();
    assert_eq!(blocked, ExitCode::from(BLOCKED_EXIT_CODE));
    let allowed =
        command_check(&config, &check(AssistanceLevel::LabTraining, "enumerate open ports"))
            .unwrap();
    assert_eq!(allowed, ExitCode::SUCCESS);

    let lines = log_lines(&config);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"content_blocked\""));
    assert!(!lines[0].contains("backdoor"));
    assert!(lines[1].contains("\"content_allowed\""));
    assert_eq!(verify_chain_file(&config.audit_log_path()).unwrap().records, 2);
}

#[test]
fn structured_check_reads_input_file() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let input = dir.path().join("draft.json");
    fs::write(&input, r#"{"summary":"ok","steps":["scan","write malware"]}"#).unwrap();
    let command = CheckCommand {
        level: AssistanceLevel::ValidationOnly,
        source: "unit-test".to_string(),
        text: None,
        input: Some(input),
        structured: true,
    };
    assert_eq!(command_check(&config, &command).unwrap(), ExitCode::from(BLOCKED_EXIT_CODE));
    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("$.steps[1]"));
}

#[test]
fn level_rejects_reserved_request_and_records_it() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let command = LevelCommand {
        environment: "lab".to_string(),
        target_owner: "self".to_string(),
        requested_level: "reserved".to_string(),
        authorized: true,
    };
    assert!(command_level(&config, &command).is_err());
    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\"context_rejected\""));
}

#[test]
fn select_rejects_invalid_observation() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let path = dir.path().join("obs.json");
    fs::write(
        &path,
        r#"[{"id":"o1","category":"port","test_type":"network","data":{},"confidence":1.5}]"#,
    )
    .unwrap();
    let command = SelectCommand {
        test_type: "network".to_string(),
        observations: path,
        level: AssistanceLevel::ValidationOnly,
    };
    assert!(command_select(&config, &command).is_err());
    assert!(log_lines(&config).is_empty());
}

#[test]
fn select_records_playbook_choice() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let path: PathBuf = dir.path().join("obs.json");
    fs::write(
        &path,
        r#"[{"id":"o1","category":"port","test_type":"network","data":{"port":3389,"service":"rdp"}}]"#,
    )
    .unwrap();
    let command = SelectCommand {
        test_type: "network".to_string(),
        observations: path,
        level: AssistanceLevel::ValidationOnly,
    };
    assert_eq!(command_select(&config, &command).unwrap(), ExitCode::SUCCESS);
    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\"playbook_selected\""));
    assert!(lines[0].contains("exposed_admin_interfaces"));
}

#[test]
fn export_event_redacts_sensitive_details() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let command = ExportEventCommand {
        level: AssistanceLevel::ValidationOnly,
        details: vec![
            ("destination".to_string(), "report.md".to_string()),
            ("api_token".to_string(), "abc123".to_string()),
        ],
    };
    assert_eq!(command_export_event(&config, command).unwrap(), ExitCode::SUCCESS);
    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\"export_completed\""));
    assert!(lines[0].contains("report.md"));
    assert!(!lines[0].contains("abc123"));
}

#[test]
fn config_validate_succeeds_on_defaults() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    assert_eq!(command_config_validate(&config).unwrap(), ExitCode::SUCCESS);
}
